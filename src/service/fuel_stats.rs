use crate::models::fuel::{FuelEconomy, FuelRecord, FuelRecordStats, PriceChange, PriceTrend};

/// Unit price differences smaller than this are reported as unchanged.
const PRICE_EPSILON: f64 = 1e-9;

fn price_per_liter(record: &FuelRecord) -> Option<f64> {
    (record.liters > 0.0).then(|| record.price_paid / record.liters)
}

fn economy(record: &FuelRecord, older: &FuelRecord) -> Option<FuelEconomy> {
    let distance = record.mileage - older.mileage;
    if distance <= 0 {
        return None;
    }

    let km = distance as f64;
    let avg_cost_per_km = record.price_paid / km;
    Some(FuelEconomy {
        distance_km: distance,
        avg_consumption: record.liters / km * 100.0,
        avg_cost_per_km,
        avg_cost_per_100km: avg_cost_per_km * 100.0,
    })
}

fn price_change(current: Option<f64>, older: Option<f64>) -> Option<PriceChange> {
    let delta = current? - older?;
    let trend = if delta > PRICE_EPSILON {
        PriceTrend::Increase
    } else if delta < -PRICE_EPSILON {
        PriceTrend::Decrease
    } else {
        PriceTrend::Unchanged
    };

    Some(PriceChange { trend, delta })
}

/// Derives per-record statistics for a list ordered by mileage descending.
/// Each record is compared with the one right after it, i.e. the next older fill-up.
pub fn derive_stats(records: &[FuelRecord]) -> Vec<FuelRecordStats> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let unit_price = price_per_liter(record);
            match records.get(index + 1) {
                Some(older) => FuelRecordStats {
                    price_per_liter: unit_price,
                    economy: economy(record, older),
                    price_change: price_change(unit_price, price_per_liter(older)),
                },
                None => FuelRecordStats {
                    price_per_liter: unit_price,
                    ..FuelRecordStats::default()
                },
            }
        })
        .collect()
}
