pub mod detectors;
pub mod scorers;

use super::error::CatalogError;
use super::eval::{Decomposed, Detector, EvaluatorKind, PerPly, Scorer};

use detectors::*;
use scorers::*;

pub enum Evaluator {
    Detector(Box<dyn Detector>),
    Scorer(Box<dyn Scorer>),
}

impl Evaluator {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Detector(detector) => detector.name(),
            Self::Scorer(scorer) => scorer.name(),
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Detector(detector) => detector.description(),
            Self::Scorer(scorer) => scorer.description(),
        }
    }

    pub fn kind(&self) -> EvaluatorKind {
        match self {
            Self::Detector(_) => EvaluatorKind::Detector,
            Self::Scorer(_) => EvaluatorKind::Scorer,
        }
    }
}

/// Evaluators by unique name, in registration order.
#[derive(Default)]
pub struct Catalog {
    entries: Vec<Evaluator>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, evaluator: Evaluator) -> Result<(), CatalogError> {
        if self.get(evaluator.name()).is_some() {
            return Err(CatalogError::DuplicateName(evaluator.name().to_string()));
        }
        self.entries.push(evaluator);
        Ok(())
    }

    pub fn add_detector(&mut self, detector: impl Detector + 'static) -> Result<(), CatalogError> {
        self.register(Evaluator::Detector(Box::new(detector)))
    }

    pub fn add_scorer(&mut self, scorer: impl Scorer + 'static) -> Result<(), CatalogError> {
        self.register(Evaluator::Scorer(Box::new(scorer)))
    }

    /// Every built-in detector, then every built-in scorer.
    pub fn standard() -> Result<Self, CatalogError> {
        let mut catalog = Self::new();

        catalog.add_detector(PerPly(OppositeSideCastling))?;
        catalog.add_detector(PerPly(TwoPromotionsInOneGame))?;
        catalog.add_detector(PerPly(Underpromotion))?;
        catalog.add_detector(PerPly(EnPassantCapture))?;
        catalog.add_detector(PerPly(BishopInCorner))?;
        catalog.add_detector(PerPly(PawnDeliversMate))?;
        catalog.add_detector(PerPly(CastlingWithCheck))?;
        catalog.add_detector(PerPly(KingOnSixthRank))?;
        catalog.add_detector(PerPly(KnightForksKingAndQueen))?;
        catalog.add_detector(PerPly(PieceCapturesThreeTimes))?;
        catalog.add_detector(PerPly(GameEndsInStalemate))?;
        catalog.add_detector(QuickCheckmate)?;

        catalog.add_scorer(LongestGame)?;
        catalog.add_scorer(DecisiveGamePercentage)?;
        catalog.add_scorer(Decomposed(BiggestPawnLead))?;
        catalog.add_scorer(Decomposed(BiggestMaterialLead))?;
        catalog.add_scorer(Decomposed(LargestCumulativeColorLead))?;
        catalog.add_scorer(Decomposed(LongestCaptureStreak))?;
        catalog.add_scorer(Decomposed(TotalChecks))?;
        catalog.add_scorer(Decomposed(FightingChessIndex))?;

        Ok(catalog)
    }

    pub fn get(&self, name: &str) -> Option<&Evaluator> {
        self.entries.iter().find(|entry| entry.name() == name)
    }

    /// The named evaluators in catalog order, or all of them for an empty
    /// filter.
    pub fn select(&self, names: &[String]) -> Result<Vec<&Evaluator>, CatalogError> {
        if let Some(unknown) = names.iter().find(|name| self.get(name).is_none()) {
            return Err(CatalogError::UnknownName(unknown.clone()));
        }
        Ok(self
            .entries
            .iter()
            .filter(|entry| names.is_empty() || names.iter().any(|name| name == entry.name()))
            .collect())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Evaluator> {
        self.entries.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(Evaluator::name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
