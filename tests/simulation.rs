use std::path::{Path, PathBuf};
use std::sync::Arc;

use tourguide_cli::{simulate, Scenario, ScenarioError};
use tourguide_registry::{load_path, Registry, RegistryImpl, TourOptions, TourStep};
use tourguide_runner::{RunPhase, RunnerConfig, RunnerError};

fn repo(path: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join(path)
}

fn bundled_tours() -> Arc<RegistryImpl> {
    let registry = Arc::new(RegistryImpl::new());
    load_path(registry.as_ref(), &repo("tours")).unwrap();
    registry
}

const WELCOME: &str = r#"
tour: welcome
frames:
  - at_ms: 0
    elements:
      - { key: start, tag: button, id: start }
  - at_ms: 1000
    elements:
      - { key: start, tag: button, id: start, classes: [clicked] }
      - { key: finish, tag: button, id: finish, rect: { x: 0, y: 60, width: 120, height: 32 } }
interactions:
  - { at_ms: 500, element: start, kind: mousedown }
  - { at_ms: 700, element: start, kind: mousedown }
  - { at_ms: 1500, element: finish, kind: mousedown }
"#;

fn welcome_registry() -> Arc<RegistryImpl> {
    let registry = Arc::new(RegistryImpl::new());
    registry
        .register(
            "welcome",
            TourOptions::default(),
            vec![
                TourStep::new("#start").with_content("Start here"),
                TourStep::new("#finish").with_extra_trigger("#start.clicked"),
            ],
        )
        .unwrap();
    registry
}

#[tokio::test(start_paused = true)]
async fn forum_scenario_walks_the_first_four_steps() {
    let source = std::fs::read_to_string(repo("scenarios/forum_question.yaml")).unwrap();
    let scenario = Scenario::from_yaml(&source).unwrap();

    let report = simulate(&scenario, bundled_tours(), RunnerConfig::default())
        .await
        .unwrap();

    let advanced: Vec<u64> = report
        .events
        .iter()
        .filter(|timed| timed.event.kind() == "step_advanced")
        .map(|timed| timed.at_ms)
        .collect();
    assert_eq!(advanced, vec![600, 1600, 2600, 3600]);
    assert_eq!(
        report.phases,
        vec![("question".to_string(), RunPhase::WaitingForTrigger)]
    );
    assert_eq!(report.kinds().last(), Some(&"tour_stopped"));
}

#[tokio::test(start_paused = true)]
async fn scripted_tour_completes_once_each_step_is_consumed() {
    let scenario = Scenario::from_yaml(WELCOME).unwrap();
    let report = simulate(&scenario, welcome_registry(), RunnerConfig::default())
        .await
        .unwrap();

    assert!(report.completed("welcome"));
    assert_eq!(
        report.kinds(),
        vec![
            "tour_started",
            "hint_shown",
            "tip_consumed",
            "step_advanced",
            "hint_shown",
            "tip_consumed",
            "step_advanced",
            "tour_completed",
        ]
    );
    let second_hint = &report.events[4];
    assert_eq!(second_hint.at_ms, 1000);
}

#[tokio::test(start_paused = true)]
async fn scenarios_without_a_tour_autostart_by_url() {
    let scenario = Scenario::from_yaml(
        "url: /forum?sort=new\nduration_ms: 100\nframes:\n  - elements: []\n",
    )
    .unwrap();
    let report = simulate(&scenario, bundled_tours(), RunnerConfig::default())
        .await
        .unwrap();
    assert_eq!(report.tours, vec!["question".to_string()]);

    let nowhere = Scenario::from_yaml("url: /nowhere\nframes:\n  - elements: []\n").unwrap();
    let err = simulate(&nowhere, bundled_tours(), RunnerConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ScenarioError::NothingToRun(_)));
}

#[tokio::test]
async fn unknown_tours_are_reported() {
    let scenario = Scenario::from_yaml("tour: missing\nframes:\n  - elements: []\n").unwrap();
    let err = simulate(&scenario, bundled_tours(), RunnerConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ScenarioError::Runner(RunnerError::NotFound(ref name)) if name == "missing"
    ));
}

#[tokio::test(start_paused = true)]
async fn auto_run_off_blocks_url_autostart() {
    let scenario = Scenario::from_yaml("url: /forum\nframes:\n  - elements: []\n").unwrap();
    let config = RunnerConfig {
        auto_run: false,
        ..RunnerConfig::default()
    };
    let err = simulate(&scenario, bundled_tours(), config).await.unwrap_err();
    assert!(matches!(err, ScenarioError::NothingToRun(_)));
}
