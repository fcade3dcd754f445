use std::process::Command;

fn main() {
    if let Ok(output) = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        && output.status.success()
    {
        let commit = String::from_utf8_lossy(&output.stdout).trim().to_string();
        println!("cargo:rustc-env=PORTAL_GIT_COMMIT={}", commit);
    }

    if let Ok(output) = Command::new("git")
        .args(["rev-parse", "--abbrev-ref", "HEAD"])
        .output()
        && output.status.success()
    {
        let branch = String::from_utf8_lossy(&output.stdout).trim().to_string();
        println!("cargo:rustc-env=PORTAL_GIT_BRANCH={}", branch);
    }

    // ISO 8601, UTC
    if let Ok(output) = Command::new("date")
        .args(["-u", "+%Y-%m-%dT%H:%M:%SZ"])
        .output()
        && output.status.success()
    {
        let timestamp = String::from_utf8_lossy(&output.stdout).trim().to_string();
        println!("cargo:rustc-env=PORTAL_BUILD_TIMESTAMP={}", timestamp);
    }
}
