//! Integration tests for depcache

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use tempfile::TempDir;

    /// A working tree, a cache root and an isolated config location
    struct Sandbox {
        work: TempDir,
        cache: TempDir,
        home: TempDir,
    }

    impl Sandbox {
        fn new() -> Self {
            Self {
                work: TempDir::new().unwrap(),
                cache: TempDir::new().unwrap(),
                home: TempDir::new().unwrap(),
            }
        }

        /// depcache pinned to this sandbox with toolchain `runtime`
        fn cmd(&self, subcommand: &str, runtime: &str) -> Command {
            let mut cmd = depcache();
            cmd.arg(subcommand)
                .arg("-C")
                .arg(self.work.path())
                .arg("--cache-dir")
                .arg(self.cache.path())
                .arg("--config")
                .arg(self.home.path().join("config.toml"))
                .args(["--platform", "os-X", "--pm-name", "pm", "--pm-version", "1.3"])
                .args(["--runtime-version", runtime]);
            cmd
        }

        fn write(&self, rel: &str, content: &str) {
            let path = self.work.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }

        fn read(&self, rel: &str) -> Option<String> {
            fs::read_to_string(self.work.path().join(rel)).ok()
        }

        fn wipe(&self, rel: &str) {
            let path = self.work.path().join(rel);
            if path.exists() {
                fs::remove_dir_all(path).unwrap();
            }
        }

        fn cached(&self, rel: &str) -> bool {
            self.cache.path().join("v1/dirs").join(rel).exists()
        }
    }

    fn depcache() -> Command {
        let mut cmd = cargo_bin_cmd!("depcache");
        for var in [
            "DEPCACHE_CACHE",
            "DEPCACHE_CACHE_DIRECTORIES",
            "DEPCACHE_CACHE_ROOT",
            "DEPCACHE_CONFIG",
            "DEPCACHE_PLATFORM",
            "DEPCACHE_RUNTIME_VERSION",
            "DEPCACHE_PM_NAME",
            "DEPCACHE_PM_VERSION",
            "STACK",
        ] {
            cmd.env_remove(var);
        }
        cmd
    }

    fn status(sandbox: &Sandbox, runtime: &str) -> String {
        let output = sandbox
            .cmd("status", runtime)
            .args(["--format", "plain"])
            .output()
            .unwrap();
        assert!(output.status.success());
        String::from_utf8(output.stdout).unwrap().trim().to_string()
    }

    #[test]
    fn help_displays() {
        depcache()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("dependency cache"));
    }

    #[test]
    fn version_displays() {
        depcache()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("depcache"));
    }

    #[test]
    fn three_builds() {
        let sandbox = Sandbox::new();
        let dirs = "vendor/deps";

        // Build 1: nothing cached
        sandbox
            .cmd("restore", "rt-12.0")
            .env("DEPCACHE_CACHE_DIRECTORIES", dirs)
            .assert()
            .success()
            .stdout(predicate::str::contains("no cached directories yet"));

        sandbox.write("vendor/deps/lib.js", "deps v1");
        sandbox
            .cmd("save", "rt-12.0")
            .env("DEPCACHE_CACHE_DIRECTORIES", dirs)
            .assert()
            .success()
            .stdout(predicate::str::contains("vendor/deps"));
        assert!(sandbox.cached("vendor/deps/lib.js"));

        // Build 2: same toolchain, fresh checkout
        sandbox.wipe("vendor");
        sandbox
            .cmd("restore", "rt-12.0")
            .env("DEPCACHE_CACHE_DIRECTORIES", dirs)
            .assert()
            .success();
        assert_eq!(sandbox.read("vendor/deps/lib.js").as_deref(), Some("deps v1"));

        // Build 3: runtime upgraded
        sandbox.wipe("vendor");
        sandbox
            .cmd("restore", "rt-13.0")
            .env("DEPCACHE_CACHE_DIRECTORIES", dirs)
            .assert()
            .success()
            .stdout(predicate::str::contains("new-signature"))
            .stdout(predicate::str::contains("vendor/deps (not restored)"));
        assert_eq!(sandbox.read("vendor/deps/lib.js"), None);
    }

    #[test]
    fn status_reports_each_case() {
        let sandbox = Sandbox::new();
        assert_eq!(status(&sandbox, "rt-12.0"), "no-cache");

        sandbox.write("node_modules/a.js", "a");
        sandbox.cmd("save", "rt-12.0").assert().success();

        assert_eq!(status(&sandbox, "rt-12.0"), "valid");
        assert_eq!(status(&sandbox, "rt-13.0"), "new-signature");

        let output = sandbox
            .cmd("status", "rt-12.0")
            .env("DEPCACHE_CACHE", "false")
            .args(["--format", "plain"])
            .output()
            .unwrap();
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "disabled");
    }

    #[test]
    fn unparsable_disable_flag_keeps_cache_enabled() {
        let sandbox = Sandbox::new();
        sandbox.write("node_modules/a.js", "a");
        sandbox
            .cmd("save", "rt-12.0")
            .env("DEPCACHE_CACHE", "sometimes")
            .assert()
            .success();

        assert!(sandbox.cached("node_modules/a.js"));
    }

    #[test]
    fn disabled_save_clears_cache() {
        let sandbox = Sandbox::new();
        sandbox.write("node_modules/a.js", "a");
        sandbox.cmd("save", "rt-12.0").assert().success();
        assert!(sandbox.cached("node_modules/a.js"));

        sandbox
            .cmd("save", "rt-12.0")
            .env("DEPCACHE_CACHE", "false")
            .assert()
            .success()
            .stdout(predicate::str::contains("disabled by config"));

        assert!(!sandbox.cached("node_modules"));
        assert!(!sandbox.cache.path().join("v1/signature").exists());
    }

    #[test]
    fn status_json() {
        let sandbox = Sandbox::new();
        let output = sandbox
            .cmd("status", "rt-12.0")
            .args(["--format", "json"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(json["status"], "no-cache");
        assert_eq!(json["fingerprint"], "v1; os-X; rt-12.0; pm 1.3");
        assert_eq!(json["directories"][0], "node_modules");
        assert_eq!(json["directory_source"], "default");
    }

    #[test]
    fn local_config_sets_directories() {
        let sandbox = Sandbox::new();
        fs::write(
            sandbox.work.path().join(".depcache.toml"),
            "[cache]\ndirectories = [\"vendor/deps\"]\n",
        )
        .unwrap();
        sandbox.write("vendor/deps/x", "x");

        sandbox.cmd("save", "rt-12.0").assert().success();

        assert!(sandbox.cached("vendor/deps/x"));
    }

    #[test]
    fn invalid_directory_fails() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd("restore", "rt-12.0")
            .env("DEPCACHE_CACHE_DIRECTORIES", "../escape")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid cache directory"));
    }

    #[cfg(unix)]
    #[test]
    fn run_saves_after_successful_install() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd("run", "rt-12.0")
            .args(["--", "sh", "-c", "mkdir -p node_modules && echo ok > node_modules/pkg"])
            .assert()
            .success();

        assert!(sandbox.cached("node_modules/pkg"));
        assert_eq!(status(&sandbox, "rt-12.0"), "valid");
    }

    #[cfg(unix)]
    #[test]
    fn run_does_not_save_after_failed_install() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd("run", "rt-12.0")
            .args(["--", "sh", "-c", "mkdir -p node_modules && exit 2"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("exited with code 2"));

        assert!(!sandbox.cached("node_modules"));
        assert_eq!(status(&sandbox, "rt-12.0"), "no-cache");
    }

    #[test]
    fn clear_with_yes() {
        let sandbox = Sandbox::new();
        sandbox.write("node_modules/a.js", "a");
        sandbox.cmd("save", "rt-12.0").assert().success();

        depcache()
            .args(["clear", "-y", "--cache-dir"])
            .arg(sandbox.cache.path())
            .arg("--config")
            .arg(sandbox.home.path().join("config.toml"))
            .assert()
            .success()
            .stdout(predicate::str::contains("Cleared"));

        assert!(!sandbox.cache.path().join("v1").exists());
    }

    #[test]
    fn config_path() {
        let home = TempDir::new().unwrap();
        let path = home.path().join("config.toml");
        depcache()
            .args(["config", "path", "--config"])
            .arg(&path)
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let home = TempDir::new().unwrap();
        depcache()
            .args(["config", "show", "--no-local", "--config"])
            .arg(home.path().join("config.toml"))
            .assert()
            .success()
            .stdout(predicate::str::contains("[cache]"));
    }
}
