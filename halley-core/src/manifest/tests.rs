use super::*;
use tempfile::TempDir;

fn template() -> ManifestTemplate {
    ManifestTemplate {
        service_name: "sequencer".to_string(),
        image: "aztecprotocol/aztec".to_string(),
        tag: "2.1.2".to_string(),
        ports: vec![
            PortBinding::tcp(8080),
            PortBinding::tcp(8880),
            PortBinding::udp(40400),
        ],
        volumes: vec![VolumeBinding::new("/srv/node/data", "/data")],
        env_keys: vec![
            "ETHEREUM_HOSTS".to_string(),
            "VALIDATOR_PRIVATE_KEYS".to_string(),
        ],
        env_file: PathBuf::from(".env"),
        restart: "unless-stopped".to_string(),
        command: vec![
            "start".to_string(),
            "--node".to_string(),
            "--archiver".to_string(),
            "--sequencer".to_string(),
        ],
    }
}

#[test]
fn test_render_is_deterministic() {
    let tpl = template();
    let first = render(&tpl).unwrap();
    let second = render(&tpl).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_render_port_bindings_exact() {
    let text = render(&template()).unwrap();
    let doc: serde_yaml::Value = serde_yaml::from_str(&text).unwrap();

    let ports = doc["services"]["sequencer"]["ports"].as_sequence().unwrap();
    let rendered: Vec<&str> = ports.iter().map(|p| p.as_str().unwrap()).collect();
    assert_eq!(rendered, vec!["8080:8080", "8880:8880", "40400:40400/udp"]);
}

#[test]
fn test_render_pins_image_tag() {
    let text = render(&template()).unwrap();
    assert!(text.contains("image: aztecprotocol/aztec:2.1.2"));
}

#[test]
fn test_environment_references_keys_not_values() {
    let text = render(&template()).unwrap();
    let doc: serde_yaml::Value = serde_yaml::from_str(&text).unwrap();

    let env = &doc["services"]["sequencer"]["environment"];
    assert_eq!(
        env["ETHEREUM_HOSTS"],
        serde_yaml::Value::from("${ETHEREUM_HOSTS}")
    );
    assert_eq!(
        env["VALIDATOR_PRIVATE_KEYS"],
        serde_yaml::Value::from("${VALIDATOR_PRIVATE_KEYS}")
    );
}

#[test]
fn test_render_carries_restart_and_command() {
    let text = render(&template()).unwrap();
    let doc: serde_yaml::Value = serde_yaml::from_str(&text).unwrap();

    assert_eq!(
        doc["services"]["sequencer"]["restart"],
        serde_yaml::Value::from("unless-stopped")
    );
    let command = doc["services"]["sequencer"]["command"]
        .as_sequence()
        .unwrap();
    assert_eq!(command[0], serde_yaml::Value::from("start"));
    assert_eq!(command.last().unwrap(), &serde_yaml::Value::from("--sequencer"));
}

#[test]
fn test_write_manifest_backs_up_existing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("docker-compose.yml");
    std::fs::write(&path, "old manifest\n").unwrap();

    let backup = write_manifest(&path, "new manifest\n").unwrap().unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "new manifest\n");
    assert_eq!(std::fs::read_to_string(&backup).unwrap(), "old manifest\n");
}

#[test]
fn test_write_manifest_first_time_has_no_backup() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("docker-compose.yml");

    let backup = write_manifest(&path, "fresh\n").unwrap();

    assert_eq!(backup, None);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "fresh\n");
}

#[test]
fn test_restore_manifest_keeps_backup() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("docker-compose.yml");
    std::fs::write(&path, "good\n").unwrap();

    let backup = write_manifest(&path, "broken\n").unwrap().unwrap();
    restore_manifest(&path, &backup).unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "good\n");
    assert!(backup.exists());
}

#[test]
fn test_read_image_tag_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("docker-compose.yml");

    let text = render(&template()).unwrap();
    write_manifest(&path, &text).unwrap();

    let (image, tag) = read_image_tag(&path).unwrap().unwrap();
    assert_eq!(image, "aztecprotocol/aztec");
    assert_eq!(tag, "2.1.2");
}

#[test]
fn test_read_image_tag_missing_file() {
    let dir = TempDir::new().unwrap();
    assert_eq!(read_image_tag(&dir.path().join("nope.yml")).unwrap(), None);
}
