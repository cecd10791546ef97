use std::cmp::Ordering;

use crate::types::Vehicle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    AskingPrice,
    EstProfit,
    RoiPercent,
    FlipScore,
    Year,
    Mileage,
}

impl SortField {
    pub const ALL: [SortField; 6] = [
        SortField::FlipScore,
        SortField::EstProfit,
        SortField::RoiPercent,
        SortField::AskingPrice,
        SortField::Year,
        SortField::Mileage,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SortField::AskingPrice => "price",
            SortField::EstProfit => "profit",
            SortField::RoiPercent => "ROI",
            SortField::FlipScore => "flip score",
            SortField::Year => "year",
            SortField::Mileage => "mileage",
        }
    }

    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    /// The field as a number; `None` when the vehicle does not carry it.
    pub fn value(&self, v: &Vehicle) -> Option<f64> {
        match self {
            SortField::AskingPrice => v.asking_price,
            SortField::EstProfit => v.est_profit,
            SortField::RoiPercent => v.roi_percent,
            SortField::FlipScore => v.flip_score,
            SortField::Year => v.year.map(|y| y as f64),
            SortField::Mileage => v.mileage.map(|m| m as f64),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flip(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Asc => "↑",
            SortDirection::Desc => "↓",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self { field: SortField::FlipScore, direction: SortDirection::Desc }
    }
}

impl SortState {
    /// Re-selecting the active field flips direction; a new field starts descending.
    pub fn select(&mut self, field: SortField) {
        if self.field == field {
            self.direction = self.direction.flip();
        } else {
            self.field = field;
            self.direction = SortDirection::Desc;
        }
    }
}

/// Compare two vehicles on `field`. Missing values go last in both directions.
pub fn compare(a: &Vehicle, b: &Vehicle, field: SortField, direction: SortDirection) -> Ordering {
    match (field.value(a), field.value(b)) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => match direction {
            SortDirection::Desc => y.total_cmp(&x),
            SortDirection::Asc => x.total_cmp(&y),
        },
    }
}

/// Stable sort in place.
pub fn sort_vehicles(list: &mut [&Vehicle], state: SortState) {
    list.sort_by(|a, b| compare(a, b, state.field, state.direction));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_profit(id: &str, profit: Option<f64>) -> Vehicle {
        Vehicle { id: id.to_string(), est_profit: profit, ..Default::default() }
    }

    fn sorted_ids(list: &[Vehicle], field: SortField, direction: SortDirection) -> Vec<String> {
        let mut refs: Vec<&Vehicle> = list.iter().collect();
        sort_vehicles(&mut refs, SortState { field, direction });
        refs.iter().map(|v| v.id.clone()).collect()
    }

    #[test]
    fn profit_desc_puts_bigger_first() {
        let list = vec![
            Vehicle { id: "1".into(), asking_price: Some(30000.0), est_profit: Some(4000.0), ..Default::default() },
            Vehicle { id: "2".into(), asking_price: Some(55000.0), est_profit: Some(9000.0), ..Default::default() },
        ];
        assert_eq!(sorted_ids(&list, SortField::EstProfit, SortDirection::Desc), vec!["2", "1"]);
    }

    #[test]
    fn directions_invert_extremes_and_missing_stays_last() {
        let list = vec![
            with_profit("mid", Some(500.0)),
            with_profit("none", None),
            with_profit("low", Some(-2000.0)),
            with_profit("high", Some(12000.0)),
        ];
        let desc = sorted_ids(&list, SortField::EstProfit, SortDirection::Desc);
        let asc = sorted_ids(&list, SortField::EstProfit, SortDirection::Asc);
        assert_eq!(desc, vec!["high", "mid", "low", "none"]);
        assert_eq!(asc, vec!["low", "mid", "high", "none"]);
        assert_eq!(desc.first(), asc.get(2));
        assert_eq!(asc.first(), desc.get(2));
    }

    #[test]
    fn every_numeric_field_sorts() {
        let a = Vehicle {
            id: "a".into(),
            asking_price: Some(1.0),
            est_profit: Some(1.0),
            roi_percent: Some(1.0),
            flip_score: Some(1.0),
            year: Some(2001),
            mileage: Some(1),
            ..Default::default()
        };
        let b = Vehicle {
            id: "b".into(),
            asking_price: Some(2.0),
            est_profit: Some(2.0),
            roi_percent: Some(2.0),
            flip_score: Some(2.0),
            year: Some(2002),
            mileage: Some(2),
            ..Default::default()
        };
        let list = vec![a, b, Vehicle { id: "c".into(), ..Default::default() }];
        for field in SortField::ALL {
            assert_eq!(sorted_ids(&list, field, SortDirection::Desc), vec!["b", "a", "c"], "{field:?}");
            assert_eq!(sorted_ids(&list, field, SortDirection::Asc), vec!["a", "b", "c"], "{field:?}");
        }
    }

    #[test]
    fn equal_keys_keep_input_order() {
        let list = vec![
            with_profit("first", Some(100.0)),
            with_profit("second", Some(100.0)),
            with_profit("third", Some(100.0)),
        ];
        assert_eq!(
            sorted_ids(&list, SortField::EstProfit, SortDirection::Desc),
            vec!["first", "second", "third"]
        );
    }

    #[test]
    fn select_same_field_flips_new_field_resets() {
        let mut s = SortState::default();
        s.select(SortField::FlipScore);
        assert_eq!(s.direction, SortDirection::Asc);
        s.select(SortField::Year);
        assert_eq!(s, SortState { field: SortField::Year, direction: SortDirection::Desc });
    }
}
