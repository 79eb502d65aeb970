//! Integration tests for catalink

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use catalink::remote::codec;
    use predicates::prelude::*;
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn catalink(temp: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("catalink");
        cmd.env("CATALINK_CONFIG", temp.path().join("config.toml"))
            .env("CATALINK_STORE_DIR", temp.path().join("persisted"));
        cmd
    }

    #[test]
    fn help_displays() {
        let temp = TempDir::new().unwrap();
        catalink(&temp)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("remote data catalog client"));
    }

    #[test]
    fn version_displays() {
        let temp = TempDir::new().unwrap();
        catalink(&temp)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("catalink"));
    }

    #[test]
    fn store_path_honors_override() {
        let temp = TempDir::new().unwrap();
        catalink(&temp)
            .args(["store", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("persisted"));
    }

    #[test]
    fn store_list_empty() {
        let temp = TempDir::new().unwrap();
        catalink(&temp)
            .args(["store", "list", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[]"));
    }

    #[test]
    fn store_clear_twice() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("persisted");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("stale.json"), "{}").unwrap();

        catalink(&temp).args(["store", "clear"]).assert().success();
        assert!(!dir.exists());
        catalink(&temp).args(["store", "clear"]).assert().success();
    }

    #[test]
    fn config_show() {
        let temp = TempDir::new().unwrap();
        catalink(&temp)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[store]"));
    }

    #[test]
    fn config_path() {
        let temp = TempDir::new().unwrap();
        catalink(&temp)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn open_without_url_fails() {
        let temp = TempDir::new().unwrap();
        catalink(&temp)
            .args(["open", "flights"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid catalog URL"));
    }

    #[test]
    fn open_unreachable_server_fails() {
        let temp = TempDir::new().unwrap();
        catalink(&temp)
            .args(["open", "flights", "--url", "http://127.0.0.1:1", "--timeout", "2"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error:"));
    }

    #[test]
    fn open_persist_writes_one_artifact() {
        let temp = TempDir::new().unwrap();
        let rt = tokio::runtime::Runtime::new().unwrap();
        let server = rt.block_on(async {
            let server = MockServer::start().await;
            let body = json!({"container": "dataframe", "source_id": "s1"});
            Mock::given(method("POST"))
                .and(path("/v1/source"))
                .respond_with(ResponseTemplate::new(200).set_body_bytes(codec::encode(&body).unwrap()))
                .mount(&server)
                .await;
            server
        });

        let output = catalink(&temp)
            .args(["open", "flights", "--url", &server.uri(), "--persist", "--format", "json"])
            .assert()
            .success()
            .get_output()
            .clone();
        let printed: Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(printed["name"], "flights");
        assert_eq!(printed["container"], "dataframe");
        assert_eq!(printed["fields"]["source_id"], "s1");

        let artifacts: Vec<_> = std::fs::read_dir(temp.path().join("persisted"))
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        assert_eq!(artifacts.len(), 1);
        let token = artifacts[0].file_stem().unwrap().to_string_lossy().to_string();
        assert!(String::from_utf8_lossy(&output.stderr).contains(&token));

        catalink(&temp)
            .args(["store", "list", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains(token));
    }
}
