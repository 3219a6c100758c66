use super::*;
use std::collections::HashSet;

fn sample_user() -> UserRecord {
    UserRecord::new(7, "striker".to_string(), Locale::EnUs, 1_700_000_000, &GameRules::default())
}

#[test]
fn test_new_user_starts_from_rules() {
    let rules = GameRules {
        starting_coins: 5,
        starting_tickets: 6,
        daily_minigame_attempts: 2,
        ..GameRules::default()
    };
    let user = UserRecord::new(1, "a".to_string(), Locale::RuRu, 42, &rules);
    assert_eq!(user.balances.coins, 5);
    assert_eq!(user.balances.tickets, 6);
    assert_eq!(user.minigame_attempts_left, 2);
    assert_eq!(user.profile.registered_at, 42);
    assert_eq!(user.record, MatchRecord::default());
    assert!(!user.ban.is_banned);
    assert!(user.validate_invariants().is_ok());
}

#[test]
fn test_invariants_reject_counter_overflow() {
    let mut user = sample_user();
    user.record = MatchRecord {
        games_played: 3,
        victories: 2,
        defeats: 2,
    };
    assert_eq!(
        user.validate_invariants(),
        Err(UserInvariantError::CountersExceedGames {
            victories: 2,
            defeats: 2,
            games_played: 3,
        })
    );
}

#[test]
fn test_invariants_reject_ghost_above_raw() {
    let mut user = sample_user();
    user.packs.add(PackTier::Big, 1);
    user.ghost_packs.add(PackTier::Big, 2);
    assert!(matches!(
        user.validate_invariants(),
        Err(UserInvariantError::GhostExceedsRaw {
            tier: PackTier::Big,
            ..
        })
    ));
}

#[test]
fn test_draws_are_games_minus_decisions() {
    let record = MatchRecord {
        games_played: 10,
        victories: 4,
        defeats: 3,
    };
    assert_eq!(record.draws(), 3);
}

#[test]
fn test_ban_expiry() {
    let mut ban = BanState::default();
    assert!(!ban.is_active(100));

    ban.is_banned = true;
    assert!(ban.is_active(100), "ban without expiry is indefinite");

    ban.ban_end = Some(200);
    assert!(ban.is_active(199));
    assert!(!ban.is_active(200));
}

#[test]
fn test_locale_from_language_code() {
    assert_eq!(Locale::from_language_code(Some("uk")), Locale::UkUa);
    assert_eq!(Locale::from_language_code(Some("RU")), Locale::RuRu);
    assert_eq!(Locale::from_language_code(Some("cs")), Locale::CsCz);
    assert_eq!(Locale::from_language_code(Some("en")), Locale::EnUs);
    assert_eq!(Locale::from_language_code(Some("de")), Locale::EnUs);
    assert_eq!(Locale::from_language_code(None), Locale::EnUs);
}

#[test]
fn test_locale_parse_and_serde_agree() {
    for locale in Locale::ALL {
        assert_eq!(locale.as_str().parse::<Locale>(), Ok(locale));
        let json = serde_json::to_string(&locale).unwrap();
        assert_eq!(json, format!("\"{}\"", locale.as_str()));
    }
    assert!("xx_XX".parse::<Locale>().is_err());
}

#[test]
fn test_default_rules_are_valid() {
    assert_eq!(GameRules::default().validate(), Ok(()));
}

#[test]
fn test_rules_validation() {
    let rules = GameRules {
        match_min_score: 6,
        match_max_score: 5,
        ..GameRules::default()
    };
    assert!(matches!(
        rules.validate(),
        Err(RulesError::EmptyRange {
            name: "match score",
            ..
        })
    ));

    let mut rules = GameRules::default();
    rules.coefficients.defeat = 1;
    assert_eq!(
        rules.validate(),
        Err(RulesError::PositiveDefeatCoefficient(1))
    );

    let rules = GameRules {
        daily_minigame_attempts: 0,
        ..GameRules::default()
    };
    assert_eq!(rules.validate(), Err(RulesError::NoDailyAttempts));
}

#[test]
fn test_partial_rules_file_keeps_defaults() {
    let yaml = "match_cost_coins: 75\ncoefficients:\n  victory: 12\n";
    let rules: GameRules = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(rules.match_cost_coins, 75);
    assert_eq!(rules.coefficients.victory, 12);
    assert_eq!(rules.coefficients.defeat, constants::DEFEAT_COEFFICIENT);
    assert_eq!(rules.match_cost_tickets, constants::MATCH_COST_TICKETS);
}

#[test]
fn test_without_waits() {
    let rules = GameRules::default().without_waits();
    assert_eq!(rules.match_wait_ms(), 0..=0);
    assert_eq!(rules.penalty_wait_ms(), 0..=0);
}

#[test]
fn test_error_message_keys() {
    let errors = [
        GameError::NotFound { user_id: 1 },
        GameError::AlreadyRegistered { user_id: 1 },
        GameError::InvalidName { len: 0, max: 32 },
        GameError::Banned {
            user_id: 1,
            until: None,
        },
        GameError::InsufficientResources {
            have_coins: 0,
            have_tickets: 0,
            need_coins: 1,
            need_tickets: 1,
        },
        GameError::NoOpponent { position: 1 },
        GameError::NoAttemptsLeft,
        GameError::NotEligible {
            success: 0,
            required: 1,
        },
        GameError::SelfReferral,
        GameError::Forbidden { user_id: 1 },
        GameError::StoreUnavailable("disk".to_string()),
    ];
    let keys: HashSet<_> = errors.iter().map(GameError::message_key).collect();
    let kinds: HashSet<_> = errors.iter().map(GameError::kind).collect();
    assert_eq!(keys.len(), errors.len(), "every kind has its own template");
    assert_eq!(kinds.len(), errors.len());
    assert_eq!(
        errors.iter().filter(|err| !err.is_expected()).count(),
        1,
        "only store failures are unexpected"
    );
}

#[test]
fn test_store_error_conversion_keeps_context() {
    let err = anyhow::anyhow!("disk I/O error").context("settle match");
    let game_err = GameError::from(err);
    assert_eq!(
        game_err,
        GameError::StoreUnavailable("settle match: disk I/O error".to_string())
    );
}

#[test]
fn test_match_outcome_serializes_tagged() {
    let outcome = MatchOutcome::Loss {
        reason: LossReason::Offside,
    };
    let json = serde_json::to_value(outcome).unwrap();
    assert_eq!(json["kind"], "loss");
    assert_eq!(json["reason"], "offside");
}
