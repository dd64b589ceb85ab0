#![cfg(feature = "serde")]

use std::rc::Rc;

use fsm_core::{ConfigError, DefinitionConfig, DefinitionError, Instance};
use fsm_events::ChannelRegistry;

const DRONE_ACTIONS: &str = r#"
name: drone_actions
initial: Searching
parameters:
  - { name: sees_unscanned, type: bool }
  - { name: scan_done, type: trigger }
  - { name: battery, type: float, initial: 1.0 }
states:
  - name: Searching
  - name: Scanning
    enter: drone.scan.begin
    exit: drone.scan.end
  - name: Docked
transitions:
  - from: Searching
    to: Scanning
    when: [{ param: sees_unscanned }]
  - name: finished
    from: Scanning
    when: [{ param: scan_done }]
  - from: "*"
    to: Docked
    when: [{ param: battery, op: "<=", value: 0.1 }]
  - from: Docked
    to: Searching
    disabled: true
"#;

#[test]
fn yaml_definition_runs() {
    let mut channels = ChannelRegistry::new();
    let config = DefinitionConfig::from_yaml_str(DRONE_ACTIONS).unwrap();
    let definition = Rc::new(config.build(&mut channels).unwrap());

    let searching = definition.state("Searching").unwrap();
    let scanning = definition.state("Scanning").unwrap();
    let docked = definition.state("Docked").unwrap();
    let sees = definition.bool_param("sees_unscanned").unwrap();
    let done = definition.trigger_param("scan_done").unwrap();
    let battery = definition.float_param("battery").unwrap();

    let mut fsm = Instance::new(definition.clone());
    assert_eq!(fsm.get_float(battery), Ok(1.0));

    fsm.set_bool(sees, true).unwrap();
    fsm.update();
    assert_eq!(fsm.current_state(), scanning);

    fsm.set_bool(sees, false).unwrap();
    fsm.set_trigger(done).unwrap();
    fsm.update();
    assert_eq!(fsm.current_state(), searching);

    fsm.set_float(battery, 0.05).unwrap();
    fsm.update();
    assert_eq!(fsm.current_state(), docked);
    fsm.update();
    assert_eq!(fsm.current_state(), docked);
}

#[test]
fn named_channels_are_shared_through_the_registry() {
    let mut channels = ChannelRegistry::new();
    let config = DefinitionConfig::from_yaml_str(DRONE_ACTIONS).unwrap();
    let definition = config.build(&mut channels).unwrap();
    let scanning = definition.state("Scanning").unwrap();

    let begin = channels.get("drone.scan.begin").unwrap();
    assert_eq!(&definition.events_for(scanning).enter, begin);
    // Unnamed channels are registered under their default names.
    assert!(channels.get("drone_actions.Scanning.update").is_some());
    assert!(channels.get("drone_actions.Searching.enter").is_some());
}

#[test]
fn json_and_yaml_agree() {
    let config = DefinitionConfig::from_yaml_str(DRONE_ACTIONS).unwrap();
    let json = serde_json::to_string(&config).unwrap();
    let back = DefinitionConfig::from_json_str(&json).unwrap();
    assert_eq!(back, config);

    let yaml = config.to_yaml_string().unwrap();
    assert_eq!(DefinitionConfig::from_yaml_str(&yaml).unwrap(), config);
}

#[test]
fn load_picks_the_format_from_the_extension() {
    let dir = std::env::temp_dir().join(format!("fsm-core-config-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    let config = DefinitionConfig::from_yaml_str(DRONE_ACTIONS).unwrap();
    let json_path = dir.join("drone.json");
    std::fs::write(&json_path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
    let yaml_path = dir.join("drone.yaml");
    std::fs::write(&yaml_path, DRONE_ACTIONS).unwrap();

    assert_eq!(DefinitionConfig::load(&json_path).unwrap(), config);
    assert_eq!(DefinitionConfig::load(&yaml_path).unwrap(), config);

    let missing = DefinitionConfig::load(&dir.join("missing.yaml")).unwrap_err();
    assert!(matches!(missing, ConfigError::Io { .. }));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn unknown_names_are_authoring_errors() {
    let bad_state = DRONE_ACTIONS.replace("to: Scanning", "to: Scan");
    let err = DefinitionConfig::from_yaml_str(&bad_state)
        .unwrap()
        .build(&mut ChannelRegistry::new())
        .unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Definition(DefinitionError::UnknownState(ref name)) if name == "Scan"
    ));

    let bad_param = DRONE_ACTIONS.replace("param: scan_done", "param: scan_finished");
    let err = DefinitionConfig::from_yaml_str(&bad_param)
        .unwrap()
        .build(&mut ChannelRegistry::new())
        .unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Definition(DefinitionError::UnknownParameter(_))
    ));
}

#[test]
fn guard_on_wrong_kind_is_rejected() {
    let bad = DRONE_ACTIONS.replace(
        "when: [{ param: sees_unscanned }]",
        "when: [{ param: sees_unscanned, op: \">\", value: 1.0 }]",
    );
    let err = DefinitionConfig::from_yaml_str(&bad)
        .unwrap()
        .build(&mut ChannelRegistry::new())
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidCondition { .. }), "{err}");
}

#[test]
fn malformed_yaml_is_reported() {
    let err = DefinitionConfig::from_yaml_str("name: [unclosed").unwrap_err();
    assert!(matches!(err, ConfigError::Yaml(_)));
}
