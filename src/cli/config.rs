//! Config command handlers

use crate::cli::ConfigInitArgs;
use std::fs;

const EXAMPLE_CONFIG: &str = include_str!("../../mosaic.example.toml");

/// Handle `mosaic config init`: write the annotated example config.
///
/// Refuses to clobber an existing file unless `--force` is given. Parent
/// directories are created as needed so `config init -o conf/mosaic.toml`
/// works in a fresh checkout.
pub fn handle_config_init(args: &ConfigInitArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.output.exists() && !args.force {
        return Err(format!(
            "{} already exists (pass --force to overwrite)",
            args.output.display()
        )
        .into());
    }

    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(&args.output, EXAMPLE_CONFIG)?;

    println!("Wrote {}", args.output.display());
    println!("Edit the [[sources]] and [[tiles]] sections, then run: mosaic serve");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_example() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mosaic.toml");

        handle_config_init(&ConfigInitArgs {
            output: path.clone(),
            force: false,
        })
        .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("[server]"));
        assert!(content.contains("[[tiles]]"));
    }

    #[test]
    fn test_init_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf/nested/mosaic.toml");

        handle_config_init(&ConfigInitArgs {
            output: path.clone(),
            force: false,
        })
        .unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_init_preserves_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mosaic.toml");
        std::fs::write(&path, "keep me").unwrap();

        let result = handle_config_init(&ConfigInitArgs {
            output: path.clone(),
            force: false,
        });

        assert!(result.is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "keep me");
    }

    #[test]
    fn test_init_force_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mosaic.toml");
        std::fs::write(&path, "old").unwrap();

        handle_config_init(&ConfigInitArgs {
            output: path.clone(),
            force: true,
        })
        .unwrap();

        assert!(std::fs::read_to_string(&path)
            .unwrap()
            .contains("[server]"));
    }

    #[test]
    fn test_example_config_is_valid() {
        let config: crate::config::MosaicConfig = toml::from_str(EXAMPLE_CONFIG).unwrap();
        config.validate().unwrap();
        assert!(!config.tiles.is_empty());
    }
}
