use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const POOL_SIZE: u8 = 45;
pub const PICK_COUNT: usize = 6;
/// Plus grand numéro considéré comme « bas ».
pub const LOW_MAX: u8 = 22;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DrawError {
    #[error("attendu 6 numéros, reçu {0}")]
    WrongCount(usize),
    #[error("numéro {0} hors limites (1-45)")]
    OutOfRange(u8),
    #[error("numéro en double : {0}")]
    Duplicate(u8),
    #[error("numéro complémentaire {0} hors limites (1-45)")]
    BonusOutOfRange(u8),
    #[error("numéro de tirage invalide : {0}")]
    InvalidDrawNo(u32),
    #[error("tirage n°{0} présent deux fois dans l'historique")]
    DuplicateDrawNo(u32),
    #[error("combinaison illisible : '{0}'")]
    Parse(String),
}

pub fn is_valid_number(n: u8) -> bool {
    (1..=POOL_SIZE).contains(&n)
}

pub fn validate_numbers(numbers: &[u8]) -> Result<(), DrawError> {
    if numbers.len() != PICK_COUNT {
        return Err(DrawError::WrongCount(numbers.len()));
    }
    for &n in numbers {
        if !is_valid_number(n) {
            return Err(DrawError::OutOfRange(n));
        }
    }
    for i in 0..numbers.len() {
        for j in (i + 1)..numbers.len() {
            if numbers[i] == numbers[j] {
                return Err(DrawError::Duplicate(numbers[i]));
            }
        }
    }
    Ok(())
}

/// Six numéros distincts de 1 à 45, toujours stockés triés.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>")]
pub struct Combination([u8; PICK_COUNT]);

impl Combination {
    pub fn new(mut numbers: [u8; PICK_COUNT]) -> Result<Self, DrawError> {
        validate_numbers(&numbers)?;
        numbers.sort_unstable();
        Ok(Self(numbers))
    }

    pub fn from_slice(numbers: &[u8]) -> Result<Self, DrawError> {
        validate_numbers(numbers)?;
        let mut arr = [0u8; PICK_COUNT];
        arr.copy_from_slice(numbers);
        arr.sort_unstable();
        Ok(Self(arr))
    }

    pub fn numbers(&self) -> &[u8; PICK_COUNT] {
        &self.0
    }

    pub fn contains(&self, n: u8) -> bool {
        self.0.binary_search(&n).is_ok()
    }

    /// Vrai si au moins un numéro de `others` figure dans la combinaison.
    pub fn intersects(&self, others: &[u8]) -> bool {
        others.iter().any(|&n| self.contains(n))
    }

    /// Paires (a, a+1) présentes dans la combinaison.
    pub fn consecutive_pairs(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
        self.0
            .windows(2)
            .filter(|w| w[1] - w[0] == 1)
            .map(|w| (w[0], w[1]))
    }
}

impl TryFrom<Vec<u8>> for Combination {
    type Error = DrawError;

    fn try_from(numbers: Vec<u8>) -> Result<Self, Self::Error> {
        Self::from_slice(&numbers)
    }
}

impl FromStr for Combination {
    type Err = DrawError;

    /// Accepte `1,2,3,4,5,6`, `[1, 2, 3, 4, 5, 6]` ou des numéros séparés par des espaces.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let inner = trimmed
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .unwrap_or(trimmed);

        let numbers = inner
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .map(|part| part.parse::<u8>().map_err(|_| DrawError::Parse(s.to_string())))
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_slice(&numbers)
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|n| format!("{:2}", n))
            .collect::<Vec<_>>()
            .join(" - ");
        write!(f, "{joined}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draw {
    pub draw_no: u32,
    pub date: NaiveDate,
    pub numbers: Combination,
    pub bonus: u8,
}

impl Draw {
    pub fn new(draw_no: u32, date: NaiveDate, numbers: &[u8], bonus: u8) -> Result<Self, DrawError> {
        let draw = Self {
            draw_no,
            date,
            numbers: Combination::from_slice(numbers)?,
            bonus,
        };
        draw.validate()?;
        Ok(draw)
    }

    pub fn validate(&self) -> Result<(), DrawError> {
        if self.draw_no == 0 {
            return Err(DrawError::InvalidDrawNo(self.draw_no));
        }
        if !is_valid_number(self.bonus) {
            return Err(DrawError::BonusOutOfRange(self.bonus));
        }
        Ok(())
    }
}

/// Historique complet, trié par numéro de tirage croissant.
///
/// Jamais modifié en place : un rafraîchissement produit un nouvel historique.
#[derive(Debug, Clone, Default)]
pub struct DrawHistory {
    draws: Vec<Draw>,
    winners: HashMap<Combination, usize>,
}

impl DrawHistory {
    pub fn new(mut draws: Vec<Draw>) -> Result<Self, DrawError> {
        for draw in &draws {
            draw.validate()?;
        }
        draws.sort_by_key(|d| d.draw_no);
        if let Some(pair) = draws.windows(2).find(|w| w[0].draw_no == w[1].draw_no) {
            return Err(DrawError::DuplicateDrawNo(pair[0].draw_no));
        }

        let mut winners = HashMap::with_capacity(draws.len());
        for (i, draw) in draws.iter().enumerate() {
            winners.entry(draw.numbers).or_insert(i);
        }

        Ok(Self { draws, winners })
    }

    pub fn draws(&self) -> &[Draw] {
        &self.draws
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Draw> {
        self.draws.iter()
    }

    pub fn len(&self) -> usize {
        self.draws.len()
    }

    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    pub fn last_draw_no(&self) -> Option<u32> {
        self.draws.last().map(|d| d.draw_no)
    }

    pub fn contains(&self, combination: &Combination) -> bool {
        self.winners.contains_key(combination)
    }

    /// Premier tirage ayant sorti exactement cette combinaison (hors complémentaire).
    pub fn winning_draw(&self, combination: &Combination) -> Option<&Draw> {
        self.winners.get(combination).map(|&i| &self.draws[i])
    }

    pub fn extended(&self, new_draws: impl IntoIterator<Item = Draw>) -> Result<Self, DrawError> {
        let mut all = self.draws.clone();
        all.extend(new_draws);
        Self::new(all)
    }
}

impl<'a> IntoIterator for &'a DrawHistory {
    type Item = &'a Draw;
    type IntoIter = std::slice::Iter<'a, Draw>;

    fn into_iter(self) -> Self::IntoIter {
        self.draws.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn draw(no: u32, numbers: [u8; 6]) -> Draw {
        Draw::new(no, date("2024-01-06"), &numbers, 45).unwrap()
    }

    #[test]
    fn test_validate_numbers_ok() {
        assert!(validate_numbers(&[1, 2, 3, 4, 5, 6]).is_ok());
        assert!(validate_numbers(&[45, 44, 43, 42, 41, 40]).is_ok());
    }

    #[test]
    fn test_validate_numbers_out_of_range() {
        assert_eq!(validate_numbers(&[0, 2, 3, 4, 5, 6]), Err(DrawError::OutOfRange(0)));
        assert_eq!(validate_numbers(&[1, 2, 3, 4, 5, 46]), Err(DrawError::OutOfRange(46)));
    }

    #[test]
    fn test_validate_numbers_wrong_count() {
        assert_eq!(validate_numbers(&[1, 2, 3, 4, 5]), Err(DrawError::WrongCount(5)));
        assert_eq!(validate_numbers(&[1, 2, 3, 4, 5, 6, 7]), Err(DrawError::WrongCount(7)));
    }

    #[test]
    fn test_validate_numbers_duplicate() {
        assert_eq!(validate_numbers(&[1, 1, 3, 4, 5, 6]), Err(DrawError::Duplicate(1)));
    }

    #[test]
    fn test_combination_is_sorted() {
        let c = Combination::new([40, 3, 17, 1, 25, 9]).unwrap();
        assert_eq!(c.numbers(), &[1, 3, 9, 17, 25, 40]);
        assert_eq!(c, Combination::new([1, 3, 9, 17, 25, 40]).unwrap());
    }

    #[test]
    fn test_combination_parse_formats() {
        let expected = Combination::new([1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!("1,2,3,4,5,6".parse::<Combination>().unwrap(), expected);
        assert_eq!("[6, 5, 4, 3, 2, 1]".parse::<Combination>().unwrap(), expected);
        assert_eq!(" 1 2 3 4 5 6 ".parse::<Combination>().unwrap(), expected);
    }

    #[test]
    fn test_combination_parse_rejects_garbage() {
        assert!(matches!("1,2,x,4,5,6".parse::<Combination>(), Err(DrawError::Parse(_))));
        assert!(matches!("1,2,300,4,5,6".parse::<Combination>(), Err(DrawError::Parse(_))));
        assert_eq!("1,2,3".parse::<Combination>(), Err(DrawError::WrongCount(3)));
        assert_eq!("1,2,3,4,5,5".parse::<Combination>(), Err(DrawError::Duplicate(5)));
    }

    #[test]
    fn test_combination_serde_validates() {
        let c: Combination = serde_json::from_str("[12, 3, 45, 7, 30, 22]").unwrap();
        assert_eq!(c.numbers(), &[3, 7, 12, 22, 30, 45]);
        assert_eq!(serde_json::to_string(&c).unwrap(), "[3,7,12,22,30,45]");
        assert!(serde_json::from_str::<Combination>("[1, 2, 3, 4, 5, 99]").is_err());
    }

    #[test]
    fn test_consecutive_pairs() {
        let c = Combination::new([1, 2, 3, 10, 20, 21]).unwrap();
        let pairs: Vec<_> = c.consecutive_pairs().collect();
        assert_eq!(pairs, vec![(1, 2), (2, 3), (20, 21)]);
    }

    #[test]
    fn test_draw_bonus_out_of_range() {
        let err = Draw::new(1, date("2024-01-06"), &[1, 2, 3, 4, 5, 6], 0).unwrap_err();
        assert_eq!(err, DrawError::BonusOutOfRange(0));
    }

    #[test]
    fn test_draw_bonus_may_repeat_main_number() {
        assert!(Draw::new(1, date("2024-01-06"), &[1, 2, 3, 4, 5, 6], 6).is_ok());
    }

    #[test]
    fn test_history_sorted_by_draw_no() {
        let history = DrawHistory::new(vec![
            draw(3, [1, 2, 3, 4, 5, 6]),
            draw(1, [7, 8, 9, 10, 11, 12]),
            draw(2, [13, 14, 15, 16, 17, 18]),
        ])
        .unwrap();
        let ids: Vec<u32> = history.iter().map(|d| d.draw_no).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(history.last_draw_no(), Some(3));
    }

    #[test]
    fn test_history_rejects_duplicate_draw_no() {
        let err = DrawHistory::new(vec![
            draw(1, [1, 2, 3, 4, 5, 6]),
            draw(1, [7, 8, 9, 10, 11, 12]),
        ])
        .unwrap_err();
        assert_eq!(err, DrawError::DuplicateDrawNo(1));
    }

    #[test]
    fn test_history_winning_draw() {
        let history = DrawHistory::new(vec![
            draw(1, [1, 2, 3, 4, 5, 6]),
            draw(2, [6, 5, 4, 3, 2, 1]),
        ])
        .unwrap();
        let c = Combination::new([1, 2, 3, 4, 5, 6]).unwrap();
        assert!(history.contains(&c));
        assert_eq!(history.winning_draw(&c).map(|d| d.draw_no), Some(1));

        let other = Combination::new([1, 2, 3, 4, 5, 7]).unwrap();
        assert!(!history.contains(&other));
        assert!(history.winning_draw(&other).is_none());
    }

    #[test]
    fn test_history_extended_is_new_value() {
        let history = DrawHistory::new(vec![draw(1, [1, 2, 3, 4, 5, 6])]).unwrap();
        let refreshed = history.extended(vec![draw(2, [7, 8, 9, 10, 11, 12])]).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(refreshed.len(), 2);
        assert!(history.extended(vec![draw(1, [7, 8, 9, 10, 11, 12])]).is_err());
    }

    #[test]
    fn test_empty_history() {
        let history = DrawHistory::default();
        assert!(history.is_empty());
        assert_eq!(history.last_draw_no(), None);
    }
}
