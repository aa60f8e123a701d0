use crate::{
    error::{
        Error,
        Result,
    },
    model::*,
    raw::{
        RawPlayer,
        RawRecord,
    },
};

const UNLIMITED_MULTIPLIER: i64 = 99;

/// Validates `raw` and maps it onto the canonical model.
///
/// Anonymous players are redacted here, so nothing downstream ever sees
/// their user id or account name.
pub fn normalize(raw: RawRecord) -> Result<(ClusterRecord, Vec<PlayerRecord>)> {
    let seed = required("seed", raw.seed)?;
    let seed = u64::try_from(seed).map_err(|_| Error::schema("seed", seed))?;

    let star_count = required("star_count", raw.star_count)?;
    let star_count = u32::try_from(star_count)
        .ok()
        .filter(|stars| *stars >= 1)
        .ok_or_else(|| Error::schema("star_count", star_count))?;

    let key = ClusterKey {
        seed,
        star_count,
        resource_multiplier: resource_multiplier(required("resource_multiplier", raw.resource_multiplier)?)?,
        combat_difficulty: combat_difficulty(required("combat_difficulty", raw.combat_difficulty)?)?,
    };

    let players = raw
        .players
        .into_iter()
        .map(normalize_player)
        .collect::<Result<Vec<_>>>()?;

    let total_power = players.iter().try_fold(0u64, |sum, player| {
        sum.checked_add(player.power)
            .ok_or_else(|| Error::schema("power", player.power))
    })?;

    let cluster = ClusterRecord {
        key,
        user_count: players.len() as u64,
        total_power,
        sails_launched: counter("sails_launched", raw.sails_launched)?,
        dyson_spheres: counter("dyson_spheres", raw.dyson_spheres)?,
    };

    trace!(?key, players = players.len(), "normalized record");
    Ok((cluster, players))
}

fn normalize_player(raw: RawPlayer) -> Result<PlayerRecord> {
    let user_id = required("user_id", raw.user_id)?;
    let power = required("power", raw.power)?;
    let power = u64::try_from(power).map_err(|_| Error::schema("power", power))?;
    let platform = match raw.platform {
        None => Platform::default(),
        Some(code) => Platform::from_code(u8::try_from(code).map_err(|_| Error::schema("platform", code))?),
    };
    let anonymous = raw.anonymous.unwrap_or(false);
    let identity = PlayerIdentity::of(&user_id);

    let (user_id, account_name) = if anonymous {
        (ANONYMOUS_PLACEHOLDER.to_string(), ANONYMOUS_PLACEHOLDER.to_string())
    } else {
        (user_id, raw.account_name.unwrap_or_default())
    };

    Ok(PlayerRecord {
        identity,
        user_id,
        platform,
        account_name,
        power,
        anonymous,
    })
}

fn required<T>(field: &'static str, value: Option<T>) -> Result<T> {
    value.ok_or(Error::Schema {
        field,
        value: "<missing>".to_string(),
    })
}

fn counter(field: &'static str, value: Option<i64>) -> Result<u64> {
    match value {
        None => Ok(0),
        Some(value) => u64::try_from(value).map_err(|_| Error::schema(field, value)),
    }
}

pub(crate) fn resource_multiplier(raw: i64) -> Result<ResourceMultiplier> {
    match raw {
        UNLIMITED_MULTIPLIER => Ok(ResourceMultiplier::Unlimited),
        1..=255 => Ok(ResourceMultiplier::Tenths(raw as u8)),
        _ => Err(Error::schema("resource_multiplier", raw)),
    }
}

pub(crate) fn combat_difficulty(raw: i64) -> Result<CombatDifficulty> {
    match raw {
        0..=99 => Ok(CombatDifficulty::Peaceful),
        100..=999 => Ok(CombatDifficulty::Code((raw % 100) as u8)),
        _ => Err(Error::schema("combat_difficulty", raw)),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn raw_record(players: Vec<RawPlayer>) -> RawRecord {
        RawRecord {
            seed: Some(95889621),
            star_count: Some(64),
            resource_multiplier: Some(5),
            combat_difficulty: Some(0),
            sails_launched: None,
            dyson_spheres: Some(3),
            players,
        }
    }

    fn raw_player(user_id: &str, power: i64, anonymous: bool) -> RawPlayer {
        RawPlayer {
            user_id: Some(user_id.to_string()),
            platform: Some(1),
            account_name: Some(format!("name-{user_id}")),
            power: Some(power),
            anonymous: Some(anonymous),
        }
    }

    #[test]
    fn maps_sentinels_and_sums_power() {
        let (cluster, players) =
            normalize(raw_record(vec![raw_player("1", 400, false), raw_player("2", 600, false)])).unwrap();

        assert_eq!(
            cluster,
            ClusterRecord {
                key: ClusterKey {
                    seed: 95889621,
                    star_count: 64,
                    resource_multiplier: ResourceMultiplier::Tenths(5),
                    combat_difficulty: CombatDifficulty::Peaceful,
                },
                user_count: 2,
                total_power: 1_000,
                sails_launched: 0,
                dyson_spheres: 3,
            }
        );
        assert_eq!(players[0].account_name, "name-1");
        assert_eq!(players[1].platform, Platform::Steam);
    }

    #[test]
    fn numeric_codes_pass_through() {
        let mut raw = raw_record(Vec::new());
        raw.resource_multiplier = Some(99);
        raw.combat_difficulty = Some(107);
        let (cluster, _) = normalize(raw).unwrap();
        assert_eq!(cluster.key.resource_multiplier, ResourceMultiplier::Unlimited);
        assert_eq!(cluster.key.combat_difficulty, CombatDifficulty::Code(7));
    }

    #[test]
    fn anonymous_players_are_redacted() {
        let (_, players) = normalize(raw_record(vec![raw_player("76561198000000001", 5, true)])).unwrap();
        let player = &players[0];
        assert!(player.anonymous);
        assert_eq!(player.user_id, ANONYMOUS_PLACEHOLDER);
        assert_eq!(player.account_name, ANONYMOUS_PLACEHOLDER);
        assert_eq!(player.identity, PlayerIdentity::of("76561198000000001"));
        assert!(!format!("{player:?}").contains("76561198000000001"));
    }

    #[test]
    fn missing_or_malformed_fields_are_schema_errors() {
        let cases: Vec<(RawRecord, &str)> = vec![
            (
                RawRecord {
                    seed: None,
                    ..raw_record(Vec::new())
                },
                "seed",
            ),
            (
                RawRecord {
                    star_count: Some(0),
                    ..raw_record(Vec::new())
                },
                "star_count",
            ),
            (
                RawRecord {
                    resource_multiplier: Some(0),
                    ..raw_record(Vec::new())
                },
                "resource_multiplier",
            ),
            (
                RawRecord {
                    combat_difficulty: Some(-1),
                    ..raw_record(Vec::new())
                },
                "combat_difficulty",
            ),
            (
                raw_record(vec![RawPlayer {
                    power: None,
                    ..raw_player("1", 0, false)
                }]),
                "power",
            ),
            (raw_record(vec![raw_player("1", -5, false)]), "power"),
            (
                raw_record(vec![raw_player("1", i64::MAX, false), raw_player("2", i64::MAX, false), raw_player("3", i64::MAX, false)]),
                "power",
            ),
        ];

        for (raw, expected) in cases {
            match normalize(raw) {
                Err(Error::Schema { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected schema error on {expected}, got {other:?}"),
            }
        }
    }

    #[test]
    fn schema_errors_carry_the_offending_value() {
        let err = normalize(raw_record(vec![raw_player("1", -5, false)])).unwrap_err();
        assert_eq!(err.kind(), "SchemaError");
        assert_eq!(err.to_string(), "invalid record: field `power` has value -5");
    }
}
