//! Aggregates the raw collections into the figures and chart series the
//! dashboard draws.

use std::collections::BTreeMap;

use chrono::DateTime;
use serde::Serialize;

use crate::calculo::{self, CostSummary};
use crate::structs::{Fotocopia, InventarioItem, PrecioConfig, TipoCopia, Trabajador};

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct LabelCount {
    pub etiqueta: String,
    pub total: i64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Dataset {
    pub label: String,
    pub data: Vec<f64>,
}

/// `labels` line up index-for-index with every dataset's `data`.
#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct WorkerStats {
    pub total: i64,
    pub activos: i64,
    pub inactivos: i64,
    pub por_departamento: Vec<LabelCount>,
    pub por_ocupacion: Vec<LabelCount>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct InventoryStats {
    pub articulos: i64,
    pub unidades: i64,
    pub por_ubicacion: Vec<LabelCount>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DashboardStats {
    pub generado_en: String,
    pub trabajadores: WorkerStats,
    pub fotocopias: CostSummary,
    pub precios: PrecioConfig,
    pub fotocopias_por_mes: ChartSeries,
    pub fotocopias_por_tipo: ChartSeries,
    pub inventario: InventoryStats,
}

/// Month bucket (`YYYY-MM`) for a stored timestamp.
fn month_of(timestamp: &str) -> String {
    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(dt) => dt.format("%Y-%m").to_string(),
        Err(_) => timestamp.chars().take(7).collect(),
    }
}

fn ranked(counts: BTreeMap<String, i64>) -> Vec<LabelCount> {
    let mut out: Vec<LabelCount> = counts
        .into_iter()
        .map(|(etiqueta, total)| LabelCount { etiqueta, total })
        .collect();
    // BTreeMap already gives name order; stable sort keeps it for ties
    out.sort_by(|a, b| b.total.cmp(&a.total));
    out
}

pub fn worker_stats(workers: &[Trabajador]) -> WorkerStats {
    let mut by_department = BTreeMap::new();
    let mut by_occupation = BTreeMap::new();
    let mut activos = 0;
    for w in workers {
        if w.activo {
            activos += 1;
        }
        *by_department.entry(w.departamento.clone()).or_insert(0) += 1;
        *by_occupation.entry(w.ocupacion.clone()).or_insert(0) += 1;
    }
    let total = workers.len() as i64;
    WorkerStats {
        total,
        activos,
        inactivos: total - activos,
        por_departamento: ranked(by_department),
        por_ocupacion: ranked(by_occupation),
    }
}

pub fn monthly_series(records: &[Fotocopia]) -> ChartSeries {
    // month -> (bn pages, color pages, sheets)
    let mut months: BTreeMap<String, (i64, i64, i64)> = BTreeMap::new();
    for r in records {
        let bucket = months.entry(month_of(&r.registrado_en)).or_default();
        let pages = calculo::record_pages(r);
        match r.tipo {
            TipoCopia::Bn => bucket.0 = bucket.0.saturating_add(pages),
            TipoCopia::Color => bucket.1 = bucket.1.saturating_add(pages),
        }
        bucket.2 = bucket.2.saturating_add(calculo::record_sheets(r));
    }

    let labels = months.keys().cloned().collect();
    let column = |f: fn(&(i64, i64, i64)) -> i64| -> Vec<f64> {
        months.values().map(|v| f(v) as f64).collect()
    };
    ChartSeries {
        labels,
        datasets: vec![
            Dataset {
                label: "Páginas B/N".into(),
                data: column(|v| v.0),
            },
            Dataset {
                label: "Páginas color".into(),
                data: column(|v| v.1),
            },
            Dataset {
                label: "Hojas".into(),
                data: column(|v| v.2),
            },
        ],
    }
}

pub fn type_series(summary: &CostSummary) -> ChartSeries {
    ChartSeries {
        labels: vec!["bn".into(), "color".into()],
        datasets: vec![Dataset {
            label: "Páginas".into(),
            data: vec![summary.paginas_bn as f64, summary.paginas_color as f64],
        }],
    }
}

pub fn inventory_stats(items: &[InventarioItem]) -> InventoryStats {
    let mut by_location = BTreeMap::new();
    for item in items {
        let place = item
            .ubicacion
            .clone()
            .unwrap_or_else(|| "Sin ubicación".to_owned());
        *by_location.entry(place).or_insert(0) += item.cantidad;
    }
    InventoryStats {
        articulos: items.len() as i64,
        unidades: items.iter().map(|i| i.cantidad).sum(),
        por_ubicacion: ranked(by_location),
    }
}

pub fn build_stats(
    workers: &[Trabajador],
    records: &[Fotocopia],
    prices: &PrecioConfig,
    inventory: &[InventarioItem],
) -> DashboardStats {
    let fotocopias = calculo::calculate_cost(records, prices);
    DashboardStats {
        generado_en: crate::utils::now(),
        trabajadores: worker_stats(workers),
        fotocopias_por_tipo: type_series(&fotocopias),
        fotocopias,
        precios: prices.clone(),
        fotocopias_por_mes: monthly_series(records),
        inventario: inventory_stats(inventory),
    }
}
