use milkyway_stats_config::HeaderStyle;
use strum::{
    Display,
    EnumIter,
};

/// Every field that appears as a column or summary line in an artifact.
#[derive(Debug, Clone, Copy, Display, EnumIter, PartialEq, Eq)]
#[strum(serialize_all = "snake_case")]
pub enum Field {
    Seed,
    StarCount,
    ResourceMultiplier,
    CombatDifficulty,
    UserCount,
    TotalPower,
    UserId,
    Platform,
    AccountName,
    Power,
    Anonymous,
    TotalPlayers,
    TotalSails,
    TotalDysonSpheres,
    Rank,
    AccountNames,
    ClusterCount,
}

impl Field {
    pub fn key(self) -> String {
        self.to_string()
    }

    /// The directory's own label.
    pub fn localized(self) -> &'static str {
        match self {
            Field::Seed => "种子",
            Field::StarCount => "星数",
            Field::ResourceMultiplier => "资源倍率",
            Field::CombatDifficulty => "战斗难度",
            Field::UserCount => "用户数",
            Field::TotalPower => "总发电量",
            Field::UserId => "用户ID",
            Field::Platform => "平台",
            Field::AccountName => "账号",
            Field::Power => "发电量",
            Field::Anonymous => "匿名",
            Field::TotalPlayers => "总玩家数",
            Field::TotalSails => "总太阳帆数",
            Field::TotalDysonSpheres => "总戴森球数",
            Field::Rank => "排名",
            Field::AccountNames => "账号列表",
            Field::ClusterCount => "星区数",
        }
    }

    pub fn label(self, style: HeaderStyle) -> String {
        match style {
            HeaderStyle::Canonical => self.key(),
            HeaderStyle::Localized => self.localized().to_string(),
        }
    }
}

pub const CLUSTER_COLUMNS: [Field; 6] = [
    Field::Seed,
    Field::StarCount,
    Field::ResourceMultiplier,
    Field::CombatDifficulty,
    Field::UserCount,
    Field::TotalPower,
];

pub const PLAYER_COLUMNS: [Field; 9] = [
    Field::Seed,
    Field::StarCount,
    Field::ResourceMultiplier,
    Field::CombatDifficulty,
    Field::UserId,
    Field::Platform,
    Field::AccountName,
    Field::Power,
    Field::Anonymous,
];

pub const ACCOUNT_COLUMNS: [Field; 6] = [
    Field::Rank,
    Field::UserId,
    Field::Platform,
    Field::AccountNames,
    Field::ClusterCount,
    Field::Power,
];

/// Summary lines always use the directory's labels.
pub const STATISTICS_LINES: [Field; 4] = [
    Field::TotalPlayers,
    Field::TotalPower,
    Field::TotalSails,
    Field::TotalDysonSpheres,
];

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashSet;
    use strum::IntoEnumIterator;

    #[test]
    fn keys_are_snake_case() {
        assert_eq!(Field::StarCount.key(), "star_count");
        assert_eq!(Field::TotalDysonSpheres.key(), "total_dyson_spheres");
    }

    #[test]
    fn localized_labels_are_unique() {
        let labels: HashSet<_> = Field::iter().map(Field::localized).collect();
        assert_eq!(labels.len(), Field::iter().count());
    }
}
