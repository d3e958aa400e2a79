//! Integration tests for depreport

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::Path;
    use tempfile::TempDir;

    /// Binary isolated from the user's config and cache
    fn depreport(temp: &Path) -> Command {
        let mut cmd = cargo_bin_cmd!("depreport");
        cmd.env("DEPREPORT_CONFIG", temp.join("config.toml"))
            .env("DEPREPORT_CACHE_DIR", temp.join("cache"))
            .env_remove("DEPREPORT_LOG")
            .arg("--no-color");
        cmd
    }

    #[test]
    fn help_displays() {
        cargo_bin_cmd!("depreport")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("health report for pinned glide dependencies"))
            .stdout(predicate::str::contains("--cache-dir"));
    }

    #[test]
    fn version_displays() {
        cargo_bin_cmd!("depreport")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("depreport"));
    }

    #[test]
    fn missing_manifest_exits_2() {
        let temp = TempDir::new().unwrap();
        let project = temp.path().join("project");
        std::fs::create_dir_all(&project).unwrap();

        depreport(temp.path())
            .arg("--project")
            .arg(&project)
            .assert()
            .code(2)
            .stderr(predicate::str::contains("Failed to find glide.yaml"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn unparsable_manifest_exits_3() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("glide.yaml"), "package: [unterminated\n").unwrap();

        depreport(temp.path())
            .arg("--project")
            .arg(temp.path())
            .assert()
            .code(3)
            .stderr(predicate::str::contains("Failed to parse"));
    }

    #[test]
    fn missing_lock_file() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("glide.yaml"),
            "package: github.com/example/app\nimport: []\n",
        )
        .unwrap();

        depreport(temp.path())
            .arg("--project")
            .arg(temp.path())
            .assert()
            .code(1)
            .stderr(predicate::str::contains("glide.lock file missing"))
            .stderr(predicate::str::contains("Run: glide update"));
    }

    #[test]
    fn invalid_config_is_reported() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("config.toml"), "[fetch]\nworkers = \"many\"\n").unwrap();

        depreport(temp.path())
            .arg("--project")
            .arg(temp.path())
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    #[test]
    fn empty_project_reports_header_only() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("glide.yaml"),
            "package: github.com/example/app\nimport: []\n",
        )
        .unwrap();
        std::fs::write(
            temp.path().join("glide.lock"),
            "hash: abc\nupdated: 2017-01-01T00:00:00Z\nimports: []\ntestImports: []\n",
        )
        .unwrap();

        depreport(temp.path())
            .arg("--project")
            .arg(temp.path())
            .assert()
            .success()
            .stdout(predicate::str::starts_with("Report on github.com/example/app"))
            .stdout(predicate::str::contains("Direct Imports"))
            .stdout(predicate::str::contains("Transitive Imports").not())
            .stderr(predicate::str::contains("Disclaimer"));
    }
}

mod git_tests {
    //! Reports against real git repositories, skipped when git is unavailable

    use assert_cmd::cargo::cargo_bin_cmd;
    use predicates::prelude::*;
    use std::path::Path;
    use std::process::Command;
    use tempfile::TempDir;

    fn git_available() -> bool {
        Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn git(dir: &Path, args: &[&str], date: &str) -> String {
        let output = Command::new("git")
            .args(["-c", "user.name=Test", "-c", "user.email=test@example.com"])
            .args(["-c", "commit.gpgsign=false", "-c", "tag.gpgsign=false"])
            .args(args)
            .current_dir(dir)
            .env("GIT_AUTHOR_DATE", date)
            .env("GIT_COMMITTER_DATE", date)
            .output()
            .unwrap();
        assert!(output.status.success(), "git {:?} failed", args);
        String::from_utf8(output.stdout).unwrap().trim().to_string()
    }

    /// An upstream repo with one commit per date; returns each commit id
    fn upstream(dir: &Path, dates: &[&str]) -> Vec<String> {
        std::fs::create_dir_all(dir).unwrap();
        git(dir, &["init", "--quiet"], dates[0]);
        dates
            .iter()
            .enumerate()
            .map(|(i, date)| {
                std::fs::write(dir.join("file.txt"), format!("{}\n", i)).unwrap();
                git(dir, &["add", "file.txt"], date);
                git(dir, &["commit", "--quiet", "-m", &format!("commit {}", i)], date);
                git(dir, &["rev-parse", "HEAD"], date)
            })
            .collect()
    }

    #[test]
    fn report_on_local_repositories() {
        if !git_available() {
            eprintln!("git not available, skipping");
            return;
        }

        let temp = TempDir::new().unwrap();
        let upstreams = temp.path().join("upstream");

        let tagged = upstreams.join("tagged");
        let tagged_revs = upstream(&tagged, &["2017-01-01T00:00:00Z", "2017-02-01T00:00:00Z"]);
        git(&tagged, &["tag", "v1.0.0", &tagged_revs[0]], "2017-02-01T00:00:00Z");
        git(&tagged, &["tag", "v1.1.0", &tagged_revs[1]], "2017-02-01T00:00:00Z");

        let untagged = upstreams.join("untagged");
        let untagged_revs = upstream(&untagged, &["2017-01-01T00:00:00Z", "2017-02-10T00:00:00Z"]);

        let project = temp.path().join("project");
        std::fs::create_dir_all(&project).unwrap();
        std::fs::write(
            project.join("glide.yaml"),
            format!(
                "package: github.com/example/app\n\
                 import:\n\
                 - package: example.com/tagged\n  repo: {}\n\
                 - package: example.com/untagged\n  repo: {}\n",
                tagged.display(),
                untagged.display()
            ),
        )
        .unwrap();
        std::fs::write(
            project.join("glide.lock"),
            format!(
                "hash: abc\n\
                 updated: 2017-03-01T00:00:00Z\n\
                 imports:\n\
                 - name: example.com/tagged\n  version: {}\n  repo: {}\n\
                 - name: example.com/untagged\n  version: {}\n  repo: {}\n\
                 testImports: []\n",
                tagged_revs[0],
                tagged.display(),
                untagged_revs[0],
                untagged.display()
            ),
        )
        .unwrap();

        let run = || {
            cargo_bin_cmd!("depreport")
                .env("DEPREPORT_CONFIG", temp.path().join("config.toml"))
                .env("DEPREPORT_CACHE_DIR", temp.path().join("cache"))
                .args(["--no-color", "--workers", "2", "--project"])
                .arg(&project)
                .assert()
                .success()
                .stdout(predicate::str::contains(
                    "● Using recent release (1 behind latest, latest: v1.1.0, using: v1.0.0)",
                ))
                .stdout(predicate::str::contains("✓ Using latest Major Semantic Version"))
                .stdout(predicate::str::contains(
                    "● Using revision within three month from the tip of the branch (40 days)",
                ));
        };

        // First run clones, second run updates the cached working copies
        run();
        run();
    }
}
