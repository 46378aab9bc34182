//! `kiln pack` and `kiln unpack`: move a directory tree in and out of a cache
//! artifact.

use kiln_pack::{collect_tree, DataSource, DirectoryTargetFactory, FileDataSource, FileDataTarget};

use crate::settings::{load_settings, packer};
use crate::{GlobalArgs, PackArgs, UnpackArgs};

/// Runs the `kiln pack` command.
///
/// Packs every file and directory below `args.dir` in sorted order. Returns
/// exit code 0 on success.
pub fn run_pack(args: &PackArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = load_settings(global)?;
    if !args.dir.is_dir() {
        return Err(format!("{} is not a directory", args.dir.display()).into());
    }

    let sources = collect_tree(&args.dir)?;
    let refs: Vec<&dyn DataSource> = sources.iter().map(|s| s as &dyn DataSource).collect();
    let name = args.output.display().to_string();
    let mut target = FileDataTarget::new(name.as_str(), &args.output);

    let summary = packer(&config.cache, args.no_compress).pack(&refs, &mut target)?;
    tracing::info!(
        artifact = %name,
        entries = summary.entries,
        bytes = summary.bytes,
        "packed"
    );
    if !global.quiet {
        eprintln!(
            "      Packed {} entries ({} bytes) into {name}",
            summary.entries, summary.bytes
        );
    }
    Ok(0)
}

/// Runs the `kiln unpack` command.
///
/// On failure no partial output is left behind. A directory created by this
/// run is removed outright; in an existing directory only the entries this
/// run created are removed.
pub fn run_unpack(
    args: &UnpackArgs,
    global: &GlobalArgs,
) -> Result<i32, Box<dyn std::error::Error>> {
    let config = load_settings(global)?;
    let name = args.file.display().to_string();
    let archive = FileDataSource::new(name.as_str(), &args.file)?;

    let existed = args.dir.exists();
    let mut factory = DirectoryTargetFactory::new(&args.dir);
    let summary = match packer(&config.cache, args.no_compress).unpack(&archive, &mut factory) {
        Ok(summary) => summary,
        Err(e) => {
            let cleanup = if existed {
                factory.discard_created().map_err(|e| e.to_string())
            } else {
                std::fs::remove_dir_all(&args.dir).map_err(|e| e.to_string())
            };
            if let Err(cleanup) = cleanup {
                tracing::warn!(
                    dir = %args.dir.display(),
                    error = %cleanup,
                    "could not remove partially unpacked entries"
                );
            }
            return Err(e.into());
        }
    };

    tracing::info!(
        artifact = %name,
        entries = summary.entries,
        bytes = summary.bytes,
        "unpacked"
    );
    if !global.quiet {
        eprintln!(
            "    Unpacked {} entries ({} bytes) into {}",
            summary.entries,
            summary.bytes,
            args.dir.display()
        );
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn global(config_dir: &Path) -> GlobalArgs {
        GlobalArgs {
            quiet: true,
            verbose: false,
            config: Some(config_dir.to_str().unwrap().to_string()),
        }
    }

    fn fixture(root: &Path) {
        fs::create_dir_all(root.join("classes/app")).unwrap();
        fs::write(root.join("classes/app/Main.class"), b"\xca\xfe\xba\xbe").unwrap();
        fs::write(root.join("classes/manifest.txt"), "Main-Class: app.Main\n").unwrap();
    }

    fn roundtrip(no_compress: bool) {
        let tmp = TempDir::new().unwrap();
        fixture(tmp.path());
        let artifact = tmp.path().join("out/classes.kiln");
        let global = global(tmp.path());

        let pack_args = PackArgs {
            dir: tmp.path().join("classes"),
            output: artifact.clone(),
            no_compress,
        };
        assert_eq!(run_pack(&pack_args, &global).unwrap(), 0);
        assert!(artifact.is_file());

        let restored = tmp.path().join("restored");
        let unpack_args = UnpackArgs {
            file: artifact,
            dir: restored.clone(),
            no_compress,
        };
        assert_eq!(run_unpack(&unpack_args, &global).unwrap(), 0);
        assert_eq!(
            fs::read(restored.join("app/Main.class")).unwrap(),
            b"\xca\xfe\xba\xbe"
        );
        assert_eq!(
            fs::read_to_string(restored.join("manifest.txt")).unwrap(),
            "Main-Class: app.Main\n"
        );
    }

    #[test]
    fn pack_unpack_gzip() {
        roundtrip(false);
    }

    #[test]
    fn pack_unpack_plain() {
        roundtrip(true);
    }

    #[test]
    fn pack_rejects_missing_dir() {
        let tmp = TempDir::new().unwrap();
        let args = PackArgs {
            dir: tmp.path().join("nope"),
            output: tmp.path().join("a.kiln"),
            no_compress: false,
        };
        assert!(run_pack(&args, &global(tmp.path())).is_err());
    }

    #[test]
    fn failed_unpack_removes_partial_output() {
        let tmp = TempDir::new().unwrap();
        fixture(tmp.path());
        let global = global(tmp.path());
        let artifact = truncated_artifact(tmp.path(), &global);

        let restored = tmp.path().join("restored");
        let args = UnpackArgs {
            file: artifact,
            dir: restored.clone(),
            no_compress: true,
        };
        assert!(run_unpack(&args, &global).is_err());
        assert!(!restored.exists());
    }

    fn truncated_artifact(tmp: &Path, global: &GlobalArgs) -> std::path::PathBuf {
        let artifact = tmp.join("classes.kiln");
        run_pack(
            &PackArgs {
                dir: tmp.join("classes"),
                output: artifact.clone(),
                no_compress: true,
            },
            global,
        )
        .unwrap();
        let bytes = fs::read(&artifact).unwrap();
        fs::write(&artifact, &bytes[..bytes.len() - 3]).unwrap();
        artifact
    }

    #[test]
    fn failed_unpack_into_existing_dir_keeps_prior_files() {
        let tmp = TempDir::new().unwrap();
        fixture(tmp.path());
        let global = global(tmp.path());
        let artifact = truncated_artifact(tmp.path(), &global);

        let restored = tmp.path().join("restored");
        fs::create_dir_all(&restored).unwrap();
        fs::write(restored.join("keep.txt"), "untouched").unwrap();

        let args = UnpackArgs {
            file: artifact,
            dir: restored.clone(),
            no_compress: true,
        };
        assert!(run_unpack(&args, &global).is_err());
        assert_eq!(
            fs::read_to_string(restored.join("keep.txt")).unwrap(),
            "untouched"
        );
        let left: Vec<_> = fs::read_dir(&restored)
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(left, vec![std::ffi::OsString::from("keep.txt")]);
    }
}
