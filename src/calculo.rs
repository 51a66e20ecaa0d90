//! Sheet and cost arithmetic for the photocopy service.

use serde::Serialize;

use crate::structs::{CalculoForm, Fotocopia, FotocopiaDetalle, PrecioConfig, TipoCopia};
use crate::utils::{coerce_int, is_truthy};

/// Largest page count a single record may carry.
pub const MAX_CANTIDAD: i64 = 100_000;
/// Largest number of copies a single record may carry.
pub const MAX_MULTIPLICADOR: i64 = 10_000;

fn clamp_inputs(cantidad: i64, multiplicador: i64) -> (i64, i64) {
    (
        cantidad.clamp(0, MAX_CANTIDAD),
        multiplicador.clamp(1, MAX_MULTIPLICADOR),
    )
}

/// Physical sheets consumed by `multiplicador` copies of a `cantidad`-page
/// document. Duplex puts two pages on a sheet; an odd trailing page still
/// takes a whole sheet. Inputs are clamped to `0..=MAX_CANTIDAD` and
/// `1..=MAX_MULTIPLICADOR`.
pub fn calculate_sheets(cantidad: i64, multiplicador: i64, doble_hoja: bool) -> i64 {
    let (cantidad, multiplicador) = clamp_inputs(cantidad, multiplicador);
    if cantidad == 0 {
        return 0;
    }

    let per_copy = if doble_hoja {
        if cantidad % 2 == 0 {
            cantidad / 2
        } else {
            cantidad / 2 + 1
        }
    } else {
        cantidad
    };

    per_copy * multiplicador
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SheetEstimate {
    pub cantidad: i64,
    pub multiplicador: i64,
    pub doble_hoja: bool,
    pub paginas: i64,
    pub hojas: i64,
}

pub fn estimate(form: &CalculoForm) -> SheetEstimate {
    let (cantidad, multiplicador) = clamp_inputs(
        coerce_int(&form.cantidad, 0),
        coerce_int(&form.multiplicador, 1),
    );
    let doble_hoja = is_truthy(&form.doble_hoja);
    SheetEstimate {
        cantidad,
        multiplicador,
        doble_hoja,
        paginas: cantidad * multiplicador,
        hojas: calculate_sheets(cantidad, multiplicador, doble_hoja),
    }
}

pub fn record_pages(record: &Fotocopia) -> i64 {
    let (cantidad, multiplicador) = clamp_inputs(record.cantidad, record.multiplicador);
    cantidad * multiplicador
}

pub fn record_sheets(record: &Fotocopia) -> i64 {
    calculate_sheets(record.cantidad, record.multiplicador, record.doble_hoja)
}

pub fn detail(record: Fotocopia) -> FotocopiaDetalle {
    FotocopiaDetalle {
        paginas: record_pages(&record),
        hojas: record_sheets(&record),
        fotocopia: record,
    }
}

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct CostSummary {
    pub registros: usize,
    pub paginas_bn: i64,
    pub paginas_color: i64,
    pub hojas: i64,
    pub facturables_bn: i64,
    pub facturables_color: i64,
    pub costo_bn: f64,
    pub costo_color: f64,
    pub costo_hojas: f64,
    pub total: f64,
}

/// Bills a batch of records. The grace allowances come off the aggregate
/// page counts, not off each record.
pub fn calculate_cost(records: &[Fotocopia], prices: &PrecioConfig) -> CostSummary {
    let mut summary = CostSummary {
        registros: records.len(),
        ..CostSummary::default()
    };

    for record in records {
        let pages = record_pages(record);
        match record.tipo {
            TipoCopia::Bn => summary.paginas_bn = summary.paginas_bn.saturating_add(pages),
            TipoCopia::Color => {
                summary.paginas_color = summary.paginas_color.saturating_add(pages)
            }
        }
        summary.hojas = summary.hojas.saturating_add(record_sheets(record));
    }

    summary.facturables_bn = summary
        .paginas_bn
        .saturating_sub(prices.fotocopia_gracia_bn)
        .max(0);
    summary.facturables_color = summary
        .paginas_color
        .saturating_sub(prices.fotocopia_gracia_color)
        .max(0);
    summary.costo_bn = summary.facturables_bn as f64 * prices.precio_bn;
    summary.costo_color = summary.facturables_color as f64 * prices.precio_color;
    summary.costo_hojas = summary.hojas as f64 * prices.precio_hoja;
    summary.total = summary.costo_bn + summary.costo_color + summary.costo_hojas;
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(cantidad: i64, multiplicador: i64, tipo: TipoCopia, doble_hoja: bool) -> Fotocopia {
        Fotocopia {
            id: 0,
            cantidad,
            multiplicador,
            tipo,
            doble_hoja,
            tipo_hoja_id: None,
            comentario: None,
            usuario_id: 1,
            registrado_en: "2025-05-01T09:00:00Z".into(),
        }
    }

    #[test]
    fn known_cases() {
        assert_eq!(calculate_sheets(9, 10, true), 50);
        assert_eq!(calculate_sheets(8, 10, true), 40);
        assert_eq!(calculate_sheets(10, 1, false), 10);
        assert_eq!(calculate_sheets(9, 1, false), 9);
        assert_eq!(calculate_sheets(1, 1, true), 1);
        assert_eq!(calculate_sheets(4, 1, true), 2);
    }

    #[test]
    fn duplex_even_and_odd() {
        for cantidad in (2..200).step_by(2) {
            assert_eq!(calculate_sheets(cantidad, 1, true), cantidad / 2);
        }
        for cantidad in (1..200).step_by(2) {
            assert_eq!(calculate_sheets(cantidad, 1, true), cantidad / 2 + 1);
        }
    }

    #[test]
    fn simplex_is_one_sheet_per_page() {
        for cantidad in 0..100 {
            assert_eq!(calculate_sheets(cantidad, 1, false), cantidad);
        }
    }

    #[test]
    fn zero_pages_is_zero_sheets() {
        for multiplicador in 1..20 {
            assert_eq!(calculate_sheets(0, multiplicador, true), 0);
            assert_eq!(calculate_sheets(0, multiplicador, false), 0);
        }
    }

    #[test]
    fn loose_inputs_fall_back_to_defaults() {
        let hojas = |cantidad, multiplicador, doble_hoja| {
            estimate(&CalculoForm {
                cantidad,
                multiplicador,
                doble_hoja,
            })
            .hojas
        };
        assert_eq!(hojas(json!("9"), json!("10"), json!(true)), 50);
        assert_eq!(hojas(json!("x"), json!(3), json!(false)), 0);
        assert_eq!(hojas(json!(5), json!(null), json!(0)), 5);
        assert_eq!(hojas(json!(5), json!(""), json!("1")), 3);
    }

    #[test]
    fn negative_copies_count_as_one() {
        let est = estimate(&CalculoForm {
            cantidad: json!(5),
            multiplicador: json!("-3"),
            doble_hoja: json!(false),
        });
        assert_eq!(est.multiplicador, 1);
        assert_eq!(est.paginas, 5);
        assert_eq!(est.hojas, 5);
        assert_eq!(calculate_sheets(5, -3, true), 3);

        let stored = record(5, -3, TipoCopia::Bn, false);
        assert_eq!(record_pages(&stored), record_sheets(&stored));
    }

    #[test]
    fn oversized_inputs_are_clamped() {
        let est = estimate(&CalculoForm {
            cantidad: json!("9223372036854775807"),
            multiplicador: json!(2),
            doble_hoja: json!(false),
        });
        assert_eq!(est.cantidad, MAX_CANTIDAD);
        assert_eq!(est.paginas, MAX_CANTIDAD * 2);

        let huge = record(i64::MAX, i64::MAX, TipoCopia::Color, true);
        assert_eq!(record_pages(&huge), MAX_CANTIDAD * MAX_MULTIPLICADOR);
        let prices = PrecioConfig {
            precio_bn: 0.0,
            precio_color: 1.0,
            precio_hoja: 0.0,
            fotocopia_gracia_bn: i64::MAX,
            fotocopia_gracia_color: 0,
        };
        let summary = calculate_cost(&[huge.clone(), huge], &prices);
        assert_eq!(summary.paginas_color, 2 * MAX_CANTIDAD * MAX_MULTIPLICADOR);
        assert_eq!(summary.facturables_bn, 0);
    }

    #[test]
    fn estimate_reports_pages_and_sheets() {
        let form = CalculoForm {
            cantidad: json!("9"),
            multiplicador: json!(10),
            doble_hoja: json!(1),
        };
        let est = estimate(&form);
        assert_eq!(est.paginas, 90);
        assert_eq!(est.hojas, 50);
        assert!(est.doble_hoja);
    }

    #[test]
    fn grace_applies_to_aggregate_counts() {
        let prices = PrecioConfig {
            precio_bn: 0.05,
            precio_color: 0.25,
            precio_hoja: 0.01,
            fotocopia_gracia_bn: 15,
            fotocopia_gracia_color: 2,
        };
        // two bn records of 10 pages each: per-record grace would bill 0, aggregate bills 5
        let records = vec![
            record(10, 1, TipoCopia::Bn, false),
            record(10, 1, TipoCopia::Bn, false),
            record(3, 1, TipoCopia::Color, true),
        ];
        let summary = calculate_cost(&records, &prices);
        assert_eq!(summary.paginas_bn, 20);
        assert_eq!(summary.paginas_color, 3);
        assert_eq!(summary.facturables_bn, 5);
        assert_eq!(summary.facturables_color, 1);
        assert_eq!(summary.hojas, 22);
        let expected = 5.0 * 0.05 + 1.0 * 0.25 + 22.0 * 0.01;
        assert!((summary.total - expected).abs() < 1e-9);
    }

    #[test]
    fn grace_larger_than_usage_bills_only_sheets() {
        let prices = PrecioConfig {
            precio_bn: 1.0,
            precio_color: 1.0,
            precio_hoja: 0.5,
            fotocopia_gracia_bn: 100,
            fotocopia_gracia_color: 100,
        };
        let summary = calculate_cost(&[record(4, 2, TipoCopia::Bn, true)], &prices);
        assert_eq!(summary.facturables_bn, 0);
        assert_eq!(summary.hojas, 4);
        assert!((summary.total - 2.0).abs() < 1e-9);
    }
}
