use crate::calendar;
use crate::model::{DateOverride, Location, LocationId, Slot};
use chrono::NaiveDate;
use std::collections::HashMap;

/// Effectifs requis par (lieu, date), 1 par défaut.
#[derive(Debug, Default)]
pub(crate) struct Staffing<'a> {
    required: HashMap<&'a LocationId, HashMap<NaiveDate, u32>>,
}

impl<'a> Staffing<'a> {
    /// En cas de doublon, la dernière entrée l'emporte.
    pub(crate) fn new(overrides: &'a [DateOverride]) -> Self {
        let mut required: HashMap<&'a LocationId, HashMap<NaiveDate, u32>> = HashMap::new();
        for o in overrides {
            required.entry(&o.location).or_default().insert(o.date, o.required);
        }
        Self { required }
    }

    pub(crate) fn required(&self, location: &LocationId, date: NaiveDate) -> u32 {
        self.required
            .get(location)
            .and_then(|by_date| by_date.get(&date))
            .copied()
            .unwrap_or(1)
    }

    /// Créneaux d'un lieu ; les dates fermées (0) sont omises.
    pub(crate) fn slots_for(&self, location: &Location, dates: &[NaiveDate]) -> Vec<Slot> {
        calendar::dates_for_location(dates, location.recurrence)
            .into_iter()
            .filter_map(|date| {
                let required = self.required(&location.id, date);
                (required > 0).then(|| Slot {
                    location: location.id.clone(),
                    date,
                    required,
                })
            })
            .collect()
    }
}

/// Créneau accompagné de la position de son lieu dans le contexte.
#[derive(Debug, Clone)]
pub(crate) struct IndexedSlot {
    pub slot: Slot,
    pub location: usize,
}

/// Construit l'ensemble des créneaux à pourvoir, lieu par lieu puis date par date.
///
/// Une liste vide signifie « aucun créneau » et n'est pas une erreur.
pub fn build_slots<'a, I>(locations: I, dates: &[NaiveDate], overrides: &[DateOverride]) -> Vec<Slot>
where
    I: IntoIterator<Item = &'a Location>,
{
    let staffing = Staffing::new(overrides);
    locations
        .into_iter()
        .flat_map(|loc| staffing.slots_for(loc, dates))
        .collect()
}
