// tests/coach_config.rs
use std::env;
use std::time::Duration;

use zoneplan_core::coach::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use zoneplan_core::{CoachConfig, CoreError, CoreResult};

const VARS: [&str; 3] = ["XAI_API_KEY", "COACH_BASE_URL", "COACH_MODEL"];

fn clear_env() {
    for v in VARS {
        env::remove_var(v);
    }
}

// Miljøet er prosess-globalt, så alt ligger i én test.
#[test]
fn config_from_env() {
    clear_env();

    // 🔑 nøkkel mangler
    let res: CoreResult<CoachConfig> = CoachConfig::from_env();
    assert!(matches!(res, Err(CoreError::Config(_))), "got {res:?}");

    // kun blanke tegn teller som mangler
    env::set_var("XAI_API_KEY", "   ");
    assert!(matches!(CoachConfig::from_env(), Err(CoreError::Config(_))));

    // ⚙️ standardverdier
    env::set_var("XAI_API_KEY", "secret");
    let cfg = CoachConfig::from_env().unwrap();
    assert_eq!(cfg.api_key, "secret");
    assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
    assert_eq!(cfg.model, DEFAULT_MODEL);
    assert_eq!(cfg.max_tokens, 2000);
    assert_eq!(cfg.timeout, Duration::from_secs(60));
    assert_eq!(cfg.completions_url(), "https://api.x.ai/v1/chat/completions");

    // 🌐 overstyring, skråstrek i slutten fjernes
    env::set_var("COACH_BASE_URL", " http://localhost:8080/v1/ ");
    env::set_var("COACH_MODEL", "grok-test");
    let cfg = CoachConfig::from_env().unwrap();
    assert_eq!(cfg.base_url, "http://localhost:8080/v1");
    assert_eq!(cfg.model, "grok-test");
    assert_eq!(cfg.completions_url(), "http://localhost:8080/v1/chat/completions");

    // tomme overstyringer ignoreres
    env::set_var("COACH_BASE_URL", "");
    env::set_var("COACH_MODEL", "  ");
    let cfg = CoachConfig::from_env().unwrap();
    assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
    assert_eq!(cfg.model, DEFAULT_MODEL);

    clear_env();
}
