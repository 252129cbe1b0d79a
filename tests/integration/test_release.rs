//! Integration tests for the `plugin-release` binary

use crate::helpers::{MANIFEST_PATH, TestWorkspace, run_plugin_release, stderr, stdout};
use anyhow::Result;

const MANIFEST: &str = r#"<idea-plugin>
  <id>com.intellij.plugins.pants</id>
  <name>Pants Support</name>
  <version>1.2.3</version>
  <idea-version since-build="171.0"/>
</idea-plugin>
"#;

const CREDENTIALS: &[(&str, &str)] = &[("USERNAME", "deployer"), ("PASSWORD", "s3cret")];

/// release.toml pointing every external tool at the given programs
///
/// `build` is a TOML array literal (program plus arguments).
fn config(build: &str, zip: &str, java: &str) -> String {
  format!(
    r#"
[manifest]
path = "{MANIFEST_PATH}"

[build]
command = {build}
clean_dir = "dist"
jar = "dist/plugin.jar"

[package]
prefix = "pants"
zip_program = '{zip}'

[upload]
java = '{java}'
client_jar = "client.jar"
host = "http://127.0.0.1:9/"
plugin_id = 7412

[registry]
page_url = "http://127.0.0.1:9/plugin/7412"
"#
  )
}

/// Fake build, zip and upload client scripts that leave evidence behind
#[cfg(unix)]
fn install_fake_tools(ws: &TestWorkspace) -> Result<()> {
  let build = ws.write_script(
    "fake-build.sh",
    &format!("grep -o '<version>[^<]*' {MANIFEST_PATH} > seen-version\nmkdir -p dist\necho jar > dist/plugin.jar"),
  )?;
  // Invoked as: zip -r <artifact> pants/
  let zip = ws.write_script("fake-zip.sh", "test -f pants/lib/plugin.jar && echo zipped > \"$2\"")?;
  // Upload client that always claims failure
  let java = ws.write_script("fake-java.sh", "echo \"$@\" > upload-args\nexit 1")?;

  ws.write_config(&config(
    &format!("['{}']", build.to_string_lossy()),
    &zip.to_string_lossy(),
    &java.to_string_lossy(),
  ))
}

#[test]
fn test_missing_version_exits_one_without_building() -> Result<()> {
  let manifest = "<idea-plugin>\n  <name>Pants Support</name>\n</idea-plugin>\n";
  let ws = TestWorkspace::new(manifest)?;
  ws.write_config(&config(r#"["touch", "build-ran"]"#, "zip", "java"))?;

  let output = run_plugin_release(&ws.path, &[], CREDENTIALS)?;

  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("version tag not found"), "{}", stderr(&output));
  assert!(!ws.file_exists("build-ran"));
  assert_eq!(ws.manifest()?, manifest);

  Ok(())
}

#[test]
fn test_outside_git_repository_exits_one() -> Result<()> {
  let dir = tempfile::TempDir::new()?;
  let manifest = dir.path().join(MANIFEST_PATH);
  std::fs::create_dir_all(manifest.parent().expect("manifest dir"))?;
  std::fs::write(&manifest, MANIFEST)?;

  let output = run_plugin_release(dir.path(), &[], CREDENTIALS)?;

  assert_eq!(output.status.code(), Some(1));
  assert_eq!(std::fs::read_to_string(&manifest)?, MANIFEST);

  Ok(())
}

#[test]
fn test_invalid_config_exits_one() -> Result<()> {
  let ws = TestWorkspace::new(MANIFEST)?;
  ws.write_config("[package]\nprefix = \"\"\n")?;

  let output = run_plugin_release(&ws.path, &[], CREDENTIALS)?;

  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("package.prefix"));

  Ok(())
}

#[test]
fn test_build_failure_restores_manifest_and_exits_zero() -> Result<()> {
  let ws = TestWorkspace::new(MANIFEST)?;
  ws.write_config(&config(r#"["false"]"#, "zip", "java"))?;
  let sha = ws.head()?;

  let output = run_plugin_release(&ws.path, &[], CREDENTIALS)?;
  let log = stderr(&output);

  assert_eq!(output.status.code(), Some(0), "{}", log);
  assert!(log.contains(&format!("Append current git sha, {}, to plugin version", sha)));
  assert!(log.contains(&format!("Releasing 1.2.3.{} to BleedingEdge channel", sha)));
  assert!(log.contains("Packaging failed"));
  assert_eq!(ws.manifest()?, MANIFEST);

  Ok(())
}

#[test]
fn test_tag_releases_manifest_version_to_stable() -> Result<()> {
  let ws = TestWorkspace::new(MANIFEST)?;
  ws.write_config(&config(r#"["false"]"#, "zip", "java"))?;

  let output = run_plugin_release(&ws.path, &["--tag", "v1.2.3"], CREDENTIALS)?;
  let log = stderr(&output);

  assert_eq!(output.status.code(), Some(0), "{}", log);
  assert!(log.contains("Releasing 1.2.3 to Stable channel"), "{}", log);
  assert!(!log.contains("Append current git sha"));
  assert_eq!(ws.manifest()?, MANIFEST);

  Ok(())
}

#[cfg(unix)]
#[test]
fn test_full_release_ignores_failing_upload_client() -> Result<()> {
  let ws = TestWorkspace::new(MANIFEST)?;
  install_fake_tools(&ws)?;
  let sha = ws.head()?;
  let artifact = format!("pants_1.2.3.{}.zip", sha);

  let output = run_plugin_release(&ws.path, &[], CREDENTIALS)?;
  let log = stderr(&output);

  // Upload client exits 1 and the registry is unreachable; still exit 0
  assert_eq!(output.status.code(), Some(0), "{}", log);
  assert!(ws.file_exists(&artifact), "missing {}\n{}", artifact, log);
  assert_eq!(ws.read_file("seen-version")?.trim(), format!("<version>1.2.3.{}", sha));

  let upload_args = ws.read_file("upload-args")?;
  assert!(upload_args.contains("-jar client.jar upload"));
  assert!(upload_args.contains("-channel BleedingEdge"));
  assert!(upload_args.contains("-username deployer -password s3cret"));
  assert!(upload_args.contains("-plugin 7412"));
  assert!(upload_args.contains(&artifact));

  assert!(log.contains("Deploy failed: not available on http://127.0.0.1:9/plugin/7412"), "{}", log);
  assert!(!log.contains("s3cret"));
  assert_eq!(ws.manifest()?, MANIFEST);

  Ok(())
}

#[cfg(unix)]
#[test]
fn test_missing_credentials_skip_upload() -> Result<()> {
  let ws = TestWorkspace::new(MANIFEST)?;
  install_fake_tools(&ws)?;

  let output = run_plugin_release(&ws.path, &[], &[])?;
  let log = stderr(&output);

  assert_eq!(output.status.code(), Some(0), "{}", log);
  assert!(log.contains("Upload skipped: USERNAME and PASSWORD must be set"), "{}", log);
  assert!(!ws.file_exists("upload-args"));
  assert_eq!(ws.manifest()?, MANIFEST);

  Ok(())
}

#[cfg(unix)]
#[test]
fn test_dry_run_json_report() -> Result<()> {
  let ws = TestWorkspace::new(MANIFEST)?;
  install_fake_tools(&ws)?;
  let sha = ws.head()?;

  let output = run_plugin_release(&ws.path, &["--dry-run", "--json"], CREDENTIALS)?;
  assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));

  let report: serde_json::Value = serde_json::from_str(&stdout(&output))?;
  assert_eq!(report["channel"], "BleedingEdge");
  assert_eq!(report["version"], format!("1.2.3.{}", sha));
  assert_eq!(report["commit"], sha);
  assert_eq!(report["packaging"]["status"], "built");
  assert_eq!(report["upload"]["status"], "skipped");
  assert_eq!(report["upload"]["reason"], "dry run");
  assert!(report["verification"].is_null());
  assert!(!ws.file_exists("upload-args"));

  Ok(())
}

#[cfg(unix)]
#[test]
fn test_sigint_during_build_restores_manifest() -> Result<()> {
  use crate::helpers::{spawn_plugin_release, wait_for_file};
  use std::time::Duration;

  let ws = TestWorkspace::new(MANIFEST)?;
  let build = ws.write_script("slow-build.sh", "touch build-started\nsleep 2")?;
  ws.write_config(&config(&format!("['{}']", build.to_string_lossy()), "zip", "java"))?;

  let child = spawn_plugin_release(&ws.path, &[], CREDENTIALS)?;
  assert!(
    wait_for_file(&ws.path.join("build-started"), Duration::from_secs(10)),
    "build never started"
  );
  assert_ne!(ws.manifest()?, MANIFEST, "manifest should be bumped during the build");

  let status = std::process::Command::new("kill")
    .args(["-INT", &child.id().to_string()])
    .status()?;
  assert!(status.success());

  let output = child.wait_with_output()?;
  let log = stderr(&output);
  assert_eq!(output.status.code(), Some(130), "{}", log);
  assert!(log.contains("Release interrupted"), "{}", log);
  assert_eq!(ws.manifest()?, MANIFEST);

  Ok(())
}
