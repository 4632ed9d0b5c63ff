use assert_cmd::Command;
use predicates::str::contains;
use std::error::Error;
use tempfile::tempdir;

// Helper function to get the path to the compiled binary
fn vconv_cmd() -> Command {
    let mut cmd = Command::cargo_bin("vconv").expect("Failed to find vconv binary");
    cmd.env("NO_COLOR", "1").env_remove("VCONV_LOG");
    cmd
}

#[test]
fn test_help_lists_convert() {
    vconv_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("convert"));
}

#[test]
fn test_convert_help_lists_flags() {
    vconv_cmd()
        .args(["convert", "--help"])
        .assert()
        .success()
        .stdout(contains("--no-hwaccel"))
        .stdout(contains("--timeout"))
        .stdout(contains("--yes"));
}

#[test]
fn test_convert_non_existent_input() -> Result<(), Box<dyn Error>> {
    let output_dir = tempdir()?;

    vconv_cmd()
        .arg("convert")
        .arg("surely/this/does/not/exist/input.avi")
        .arg("-o")
        .arg(output_dir.path())
        .assert()
        .failure()
        .code(1)
        .stderr(contains("does not exist"));

    // The run log is created before the input is checked
    assert!(output_dir.path().join("logs").is_dir());
    Ok(())
}

#[test]
fn test_missing_ffmpeg_is_fatal() -> Result<(), Box<dyn Error>> {
    let input_dir = tempdir()?;
    let output_dir = tempdir()?;
    std::fs::write(input_dir.path().join("clip.avi"), b"dummy content")?;

    vconv_cmd()
        .arg("convert")
        .arg(input_dir.path())
        .arg("-o")
        .arg(output_dir.path())
        .arg("--ffmpeg")
        .arg(output_dir.path().join("no-such-ffmpeg"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("not found"));
    Ok(())
}

#[test]
fn test_invalid_jobs_value() {
    vconv_cmd()
        .args(["convert", "videos", "--jobs", "0"])
        .assert()
        .failure()
        .code(2);
}

#[cfg(unix)]
mod with_fake_tools {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    const FAKE_FFPROBE: &str = r#"#!/bin/sh
if [ "$1" = "-version" ]; then echo "ffprobe version fake"; exit 0; fi
for last; do :; done
case "$(head -c 4 "$last")" in
  HUFF)
    echo '{"streams":[{"codec_type":"video","codec_name":"huffyuv","width":720,"height":576,"r_frame_rate":"25/1"}],"format":{"format_name":"avi"}}'
    ;;
  *)
    echo "Invalid data found when processing input" >&2
    exit 1
    ;;
esac
"#;

    const FAKE_FFMPEG: &str = r#"#!/bin/sh
if [ "$1" = "-version" ]; then echo "ffmpeg version fake"; exit 0; fi
in=""; prev=""; out=""
for a in "$@"; do
  if [ "$prev" = "-i" ]; then in="$a"; fi
  prev="$a"; out="$a"
done
case "$in" in
  color=*) exit 1 ;;
esac
cp "$in" "$out"
"#;

    fn install(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn fake_tools_cmd(tools: &Path) -> Command {
        let mut cmd = vconv_cmd();
        cmd.env("VCONV_FFMPEG", install(tools, "ffmpeg", FAKE_FFMPEG))
            .env("VCONV_FFPROBE", install(tools, "ffprobe", FAKE_FFPROBE));
        cmd
    }

    #[test]
    fn test_convert_all_with_yes() -> Result<(), Box<dyn Error>> {
        let tools = tempdir()?;
        let input_dir = tempdir()?;
        let output_dir = tempdir()?;
        fs::write(input_dir.path().join("tape.avi"), b"HUFFYUV capture")?;
        fs::write(input_dir.path().join("notes.avi"), b"not a video")?;

        fake_tools_cmd(tools.path())
            .arg("convert")
            .arg(input_dir.path())
            .arg("-o")
            .arg(output_dir.path())
            .arg("--yes")
            .assert()
            .success()
            .stdout(contains("tape.avi"))
            .stdout(contains("HighQualityReencode (crf 17)"))
            .stdout(contains("SUMMARY"))
            .stdout(contains("UNREADABLE"));

        let converted: Vec<_> = walk(output_dir.path())
            .into_iter()
            .filter(|p| p.ends_with("tape/tape.mp4"))
            .collect();
        assert_eq!(converted.len(), 1);
        assert_eq!(fs::read(&converted[0])?, b"HUFFYUV capture");
        Ok(())
    }

    #[test]
    fn test_interactive_quit() -> Result<(), Box<dyn Error>> {
        let tools = tempdir()?;
        let input_dir = tempdir()?;
        let output_dir = tempdir()?;
        fs::write(input_dir.path().join("tape.avi"), b"HUFFYUV capture")?;

        fake_tools_cmd(tools.path())
            .arg("convert")
            .arg(input_dir.path())
            .arg("-o")
            .arg(output_dir.path())
            .write_stdin("7\nq\n")
            .assert()
            .success()
            .stdout(contains("Invalid choice '7'"));

        assert!(walk(output_dir.path())
            .iter()
            .all(|p| p.extension().is_none_or(|ext| ext != "mp4")));
        Ok(())
    }

    #[test]
    fn test_nothing_convertible_fails() -> Result<(), Box<dyn Error>> {
        let tools = tempdir()?;
        let input_dir = tempdir()?;
        let output_dir = tempdir()?;
        fs::write(input_dir.path().join("notes.avi"), b"not a video")?;

        fake_tools_cmd(tools.path())
            .arg("convert")
            .arg(input_dir.path())
            .arg("-o")
            .arg(output_dir.path())
            .arg("--yes")
            .assert()
            .failure()
            .code(1);
        Ok(())
    }

    fn walk(dir: &Path) -> Vec<PathBuf> {
        let mut found = Vec::new();
        for entry in fs::read_dir(dir).into_iter().flatten().flatten() {
            let path = entry.path();
            if path.is_dir() {
                found.extend(walk(&path));
            } else {
                found.push(path);
            }
        }
        found
    }
}
