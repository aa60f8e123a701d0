//! Binary payloads of the Milky Way directory.
//!
//! All integers are little-endian. Strings carry a 7-bit variable-length
//! prefix followed by UTF-8 bytes. Generation is reported per game tick; the
//! game runs 60 ticks per second.

use crate::{
    error::{
        Error,
        Result,
    },
    fetch::ClusterParams,
    model::{
        CombatDifficulty,
        ResourceMultiplier,
    },
    raw::{
        RawPlayer,
        RawRecord,
    },
};

pub const TICKS_PER_SECOND: i64 = 60;

const SEED_FACTOR: i64 = 100_000_000;
const STARS_FACTOR: i64 = 100_000;
const MULTIPLIER_FACTOR: i64 = 1_000;

/// Global counters from the statistics endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Statistics {
    /// Watts.
    pub generation: i64,
    pub sails_launched: i64,
    pub players: i32,
    pub dyson_spheres: i32,
}

/// One player row as it appears in user listings and cluster pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WirePlayer {
    pub seed_key: i64,
    pub user_id: i64,
    pub platform: u8,
    pub account_name: String,
    /// Watts.
    pub power: i64,
    pub anonymous: bool,
}

impl WirePlayer {
    /// Splits the seed key into the cluster fields of a single-player record.
    pub fn into_raw_record(self) -> RawRecord {
        let key = self.seed_key;
        RawRecord {
            seed: Some(key / SEED_FACTOR),
            star_count: Some((key / STARS_FACTOR) % 1000),
            resource_multiplier: Some((key / MULTIPLIER_FACTOR) % 100),
            combat_difficulty: Some(key % 1000),
            sails_launched: None,
            dyson_spheres: None,
            players: vec![RawPlayer {
                user_id: Some(self.user_id.to_string()),
                platform: Some(self.platform as i64),
                account_name: Some(self.account_name),
                power: Some(self.power),
                anonymous: Some(self.anonymous),
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterPage {
    pub total: i64,
    pub page_index: i32,
    pub players: Vec<WirePlayer>,
}

/// Packs a seed and its cluster parameters the way the directory keys clusters.
pub fn encode_seed_key(seed: u64, params: &ClusterParams) -> Result<i64> {
    let multiplier = match params.resource_multiplier {
        ResourceMultiplier::Unlimited => 99,
        ResourceMultiplier::Tenths(tenths) if tenths < 99 => tenths as i64,
        ResourceMultiplier::Tenths(tenths) => return Err(Error::schema("resource_multiplier", tenths)),
    };
    let difficulty = match params.combat_difficulty {
        CombatDifficulty::Peaceful => 0,
        CombatDifficulty::Code(code) if code < 100 => 100 + code as i64,
        CombatDifficulty::Code(code) => return Err(Error::schema("combat_difficulty", code)),
    };
    if params.star_count == 0 || params.star_count >= 1000 {
        return Err(Error::schema("star_count", params.star_count));
    }

    i64::try_from(seed)
        .ok()
        .and_then(|seed| seed.checked_mul(SEED_FACTOR))
        .map(|key| key + params.star_count as i64 * STARS_FACTOR + multiplier * MULTIPLIER_FACTOR + difficulty)
        .ok_or_else(|| Error::schema("seed", seed))
}

pub fn decode_statistics(payload: &[u8]) -> Result<Statistics> {
    let mut r = WireReader::new(payload);
    let _version = r.i32()?;
    let generation = per_second(r.i64()?)?;
    Ok(Statistics {
        generation,
        sails_launched: r.i64()?,
        players: r.i32()?,
        dyson_spheres: r.i32()?,
    })
}

pub fn decode_user_list(payload: &[u8]) -> Result<Vec<WirePlayer>> {
    let mut r = WireReader::new(payload);
    let _version = r.i32()?;
    let count = r.count()?;
    (0..count).map(|_| r.player()).collect()
}

/// Decodes at most `page_size` players, as the directory never sends more.
pub fn decode_cluster_page(payload: &[u8], page_size: u32) -> Result<ClusterPage> {
    let mut r = WireReader::new(payload);
    let _version = r.i32()?;
    let total = r.i64()?;
    let page_index = r.i32()?;
    let count = r.count()?.min(page_size as usize);
    let players = (0..count).map(|_| r.player()).collect::<Result<_>>()?;
    Ok(ClusterPage {
        total,
        page_index,
        players,
    })
}

fn per_second(per_tick: i64) -> Result<i64> {
    per_tick
        .checked_mul(TICKS_PER_SECOND)
        .ok_or_else(|| Error::fetch(format!("generation {per_tick} per tick overflows")))
}

struct WireReader<'a> {
    payload: &'a [u8],
    offset: usize,
}

impl<'a> WireReader<'a> {
    fn new(payload: &'a [u8]) -> Self {
        Self { payload, offset: 0 }
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self.bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    fn bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.offset.checked_add(len).filter(|end| *end <= self.payload.len());
        let Some(end) = end else {
            return Err(Error::fetch(format!(
                "payload truncated: wanted {len} bytes at offset {} of {}",
                self.offset,
                self.payload.len()
            )));
        };
        let bytes = &self.payload[self.offset..end];
        self.offset = end;
        Ok(bytes)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take::<1>()?[0])
    }

    fn i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.take()?))
    }

    fn i64(&mut self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.take()?))
    }

    fn count(&mut self) -> Result<usize> {
        let count = self.i32()?;
        usize::try_from(count).map_err(|_| Error::fetch(format!("negative record count {count}")))
    }

    /// Length prefix of at most five 7-bit groups, lowest group first.
    fn varint(&mut self) -> Result<usize> {
        let mut value: u32 = 0;
        for shift in (0..35).step_by(7) {
            let byte = self.u8()?;
            value |= ((byte & 0x7f) as u32) << shift;
            if byte & 0x80 == 0 {
                return Ok(value as usize);
            }
        }
        Err(Error::fetch("string length prefix longer than five bytes"))
    }

    fn string(&mut self) -> Result<String> {
        let len = self.varint()?;
        Ok(String::from_utf8_lossy(self.bytes(len)?).into_owned())
    }

    fn player(&mut self) -> Result<WirePlayer> {
        Ok(WirePlayer {
            seed_key: self.i64()?,
            user_id: self.i64()?,
            platform: self.u8()?,
            account_name: self.string()?,
            power: per_second(self.i64()?)?,
            anonymous: self.u8()? > 0,
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    /// Builds payloads in the directory's layout.
    #[derive(Default)]
    pub(crate) struct WireWriter(pub(crate) Vec<u8>);

    impl WireWriter {
        pub(crate) fn i32(mut self, value: i32) -> Self {
            self.0.extend_from_slice(&value.to_le_bytes());
            self
        }

        pub(crate) fn i64(mut self, value: i64) -> Self {
            self.0.extend_from_slice(&value.to_le_bytes());
            self
        }

        pub(crate) fn player(mut self, seed_key: i64, user_id: i64, name: &str, per_tick: i64, anonymous: bool) -> Self {
            self = self.i64(seed_key).i64(user_id);
            self.0.push(1);
            let mut len = name.len();
            loop {
                let byte = (len & 0x7f) as u8;
                len >>= 7;
                if len == 0 {
                    self.0.push(byte);
                    break;
                }
                self.0.push(byte | 0x80);
            }
            self.0.extend_from_slice(name.as_bytes());
            self = self.i64(per_tick);
            self.0.push(anonymous as u8);
            self
        }
    }
}

#[cfg(test)]
mod test {
    use super::{
        test_support::WireWriter,
        *,
    };
    use pretty_assertions::assert_eq;

    const PEACEFUL_HALF: i64 = 9_588_962_106_405_000;

    #[test]
    fn decodes_statistics() {
        let payload = WireWriter::default().i32(1).i64(1_000).i64(77).i32(49).i32(12).0;
        assert_eq!(
            decode_statistics(&payload).unwrap(),
            Statistics {
                generation: 60_000,
                sails_launched: 77,
                players: 49,
                dyson_spheres: 12,
            }
        );
    }

    #[test]
    fn decodes_user_list_and_seed_keys() {
        let name = "戴森".repeat(30);
        let payload = WireWriter::default()
            .i32(1)
            .i32(1)
            .player(PEACEFUL_HALF, 76561198000000001, &name, 5, true)
            .0;
        let players = decode_user_list(&payload).unwrap();
        assert_eq!(players[0].account_name, name);
        assert_eq!(players[0].power, 300);

        let raw = players[0].clone().into_raw_record();
        assert_eq!(raw.seed, Some(95889621));
        assert_eq!(raw.star_count, Some(64));
        assert_eq!(raw.resource_multiplier, Some(5));
        assert_eq!(raw.combat_difficulty, Some(0));
        assert_eq!(raw.players[0].user_id.as_deref(), Some("76561198000000001"));
        assert_eq!(raw.players[0].anonymous, Some(true));
    }

    #[test]
    fn cluster_pages_are_capped_at_page_size() {
        let mut writer = WireWriter::default().i32(1).i64(25).i32(2).i32(12);
        for user in 0..12 {
            writer = writer.player(PEACEFUL_HALF, user, "p", 1, false);
        }
        let page = decode_cluster_page(&writer.0, 10).unwrap();
        assert_eq!(page.total, 25);
        assert_eq!(page.page_index, 2);
        assert_eq!(page.players.len(), 10);
    }

    #[test]
    fn truncated_and_negative_payloads_are_fetch_errors() {
        let truncated = WireWriter::default().i32(1).i32(1).i64(5).0;
        assert_eq!(decode_user_list(&truncated).unwrap_err().kind(), "FetchError");

        let negative = WireWriter::default().i32(1).i32(-3).0;
        assert_eq!(decode_user_list(&negative).unwrap_err().kind(), "FetchError");

        let bad_varint = {
            let mut payload = WireWriter::default().i32(1).i32(1).i64(1).i64(1).0;
            payload.push(1);
            payload.extend_from_slice(&[0xff; 6]);
            payload
        };
        assert_eq!(decode_user_list(&bad_varint).unwrap_err().kind(), "FetchError");
    }

    #[test]
    fn seed_keys_round_trip_through_the_normalizer_codes() {
        let params = ClusterParams {
            star_count: 64,
            resource_multiplier: ResourceMultiplier::Tenths(5),
            combat_difficulty: CombatDifficulty::Peaceful,
        };
        assert_eq!(encode_seed_key(95889621, &params).unwrap(), PEACEFUL_HALF);

        let params = ClusterParams {
            star_count: 32,
            resource_multiplier: ResourceMultiplier::Unlimited,
            combat_difficulty: CombatDifficulty::Code(7),
        };
        assert_eq!(encode_seed_key(1, &params).unwrap(), 100_000_000 + 3_200_000 + 99_000 + 107);

        let too_many_stars = ClusterParams {
            star_count: 1000,
            ..params
        };
        assert!(encode_seed_key(1, &too_many_stars).is_err());
    }
}
