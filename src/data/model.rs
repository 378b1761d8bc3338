//! Typed participant rows for the CAKe study.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// CAKe score at or above which a participant counts as cognitively normal.
pub const DEFAULT_CAKE_CUTOFF: f64 = 21.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Sex {
    Female,
    Male,
}

impl Sex {
    pub const ALL: [Sex; 2] = [Sex::Female, Sex::Male];

    /// Panel title used when results are split by sex.
    pub fn plural(self) -> &'static str {
        match self {
            Sex::Female => "Females",
            Sex::Male => "Males",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Female => f.write_str("Female"),
            Sex::Male => f.write_str("Male"),
        }
    }
}

/// Rejected `Sex` cell value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSex(pub String);

impl FromStr for Sex {
    type Err = UnknownSex;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("female") {
            Ok(Sex::Female)
        } else if trimmed.eq_ignore_ascii_case("male") {
            Ok(Sex::Male)
        } else {
            Err(UnknownSex(trimmed.to_string()))
        }
    }
}

/// Split of participants by CAKe score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CakeGroup {
    Normal,
    Impaired,
}

impl CakeGroup {
    pub fn classify(cake: f64, cutoff: f64) -> Self {
        if cake >= cutoff {
            CakeGroup::Normal
        } else {
            CakeGroup::Impaired
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CakeGroup::Normal => "Normal",
            CakeGroup::Impaired => "Impaired",
        }
    }
}

/// Memory-accuracy measures recorded per participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Measure {
    SourceContext,
    SourceFeature,
    ItemContext,
    ItemFeature,
}

impl Measure {
    pub const ALL: [Measure; 4] = [
        Measure::SourceContext,
        Measure::SourceFeature,
        Measure::ItemContext,
        Measure::ItemFeature,
    ];

    pub fn column(self) -> &'static str {
        match self {
            Measure::SourceContext => "SourceAccC",
            Measure::SourceFeature => "SourceAccF",
            Measure::ItemContext => "ItemAccC",
            Measure::ItemFeature => "ItemAccF",
        }
    }

    /// Column name in the raw study export.
    pub fn raw_column(self) -> &'static str {
        match self {
            Measure::SourceContext => "context source accuracy",
            Measure::SourceFeature => "feature source accuracy",
            Measure::ItemContext => "context item accuracy",
            Measure::ItemFeature => "feature item accuracy",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Measure::SourceContext => "Source memory(context)",
            Measure::SourceFeature => "Source memory(feature)",
            Measure::ItemContext => "Item memory(context)",
            Measure::ItemFeature => "Item memory(feature)",
        }
    }

    pub fn is_context(self) -> bool {
        matches!(self, Measure::SourceContext | Measure::ItemContext)
    }

    pub fn is_source(self) -> bool {
        matches!(self, Measure::SourceContext | Measure::SourceFeature)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Participant {
    pub cake: f64,
    pub source_acc_context: f64,
    pub source_acc_feature: f64,
    pub item_acc_context: f64,
    pub item_acc_feature: f64,
    pub sex: Option<Sex>,
}

impl Participant {
    pub fn measure(&self, measure: Measure) -> f64 {
        match measure {
            Measure::SourceContext => self.source_acc_context,
            Measure::SourceFeature => self.source_acc_feature,
            Measure::ItemContext => self.item_acc_context,
            Measure::ItemFeature => self.item_acc_feature,
        }
    }
}

/// Participants in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticipantTable {
    participants: Vec<Participant>,
}

impl ParticipantTable {
    pub fn new(participants: Vec<Participant>) -> Self {
        Self { participants }
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn cake_scores(&self) -> Vec<f64> {
        self.participants.iter().map(|p| p.cake).collect()
    }

    pub fn values(&self, measure: Measure) -> Vec<f64> {
        self.participants.iter().map(|p| p.measure(measure)).collect()
    }

    /// Participants falling in `group` for the given CAKe cutoff.
    pub fn by_group(&self, cutoff: f64, group: CakeGroup) -> ParticipantTable {
        self.filtered(|p| CakeGroup::classify(p.cake, cutoff) == group)
    }

    /// Participants with a recorded sex equal to `sex`.
    pub fn by_sex(&self, sex: Sex) -> ParticipantTable {
        self.filtered(|p| p.sex == Some(sex))
    }

    fn filtered(&self, keep: impl Fn(&Participant) -> bool) -> ParticipantTable {
        ParticipantTable::new(
            self.participants
                .iter()
                .filter(|p| keep(p))
                .cloned()
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant(cake: f64, sex: Option<Sex>) -> Participant {
        Participant {
            cake,
            source_acc_context: cake / 100.0,
            source_acc_feature: 0.8,
            item_acc_context: 0.9,
            item_acc_feature: 0.95,
            sex,
        }
    }

    #[test]
    fn test_sex_parsing() {
        assert_eq!("Female".parse::<Sex>(), Ok(Sex::Female));
        assert_eq!(" male ".parse::<Sex>(), Ok(Sex::Male));
        assert_eq!(
            "Other".parse::<Sex>(),
            Err(UnknownSex("Other".to_string()))
        );
    }

    #[test]
    fn test_cake_cutoff_is_inclusive() {
        assert_eq!(CakeGroup::classify(21.0, DEFAULT_CAKE_CUTOFF), CakeGroup::Normal);
        assert_eq!(CakeGroup::classify(20.5, DEFAULT_CAKE_CUTOFF), CakeGroup::Impaired);
    }

    #[test]
    fn test_table_selectors_keep_file_order() {
        let table = ParticipantTable::new(vec![
            participant(24.0, Some(Sex::Female)),
            participant(12.0, Some(Sex::Male)),
            participant(21.0, None),
            participant(18.0, Some(Sex::Female)),
        ]);

        let normal = table.by_group(DEFAULT_CAKE_CUTOFF, CakeGroup::Normal);
        assert_eq!(normal.cake_scores(), vec![24.0, 21.0]);

        let impaired = table.by_group(DEFAULT_CAKE_CUTOFF, CakeGroup::Impaired);
        assert_eq!(impaired.values(Measure::SourceContext), vec![0.12, 0.18]);

        let females = table.by_sex(Sex::Female);
        assert_eq!(females.cake_scores(), vec![24.0, 18.0]);
        assert_eq!(table.by_sex(Sex::Male).len(), 1);
    }

    #[test]
    fn test_measure_metadata() {
        assert_eq!(Measure::ItemFeature.column(), "ItemAccF");
        assert_eq!(Measure::SourceContext.raw_column(), "context source accuracy");
        assert!(Measure::ItemContext.is_context());
        assert!(!Measure::ItemContext.is_source());
    }
}
