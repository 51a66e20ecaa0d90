//! In-memory list pipeline: filter, sort, paginate.
//!
//! Collections are small, so endpoints load whole tables and shape them here
//! rather than pushing search/sort/limit into SQL.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::structs::{FotocopiaDetalle, InventarioItem, Trabajador};

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum StatusFilter {
    #[serde(rename = "active", alias = "activo")]
    Active,
    #[serde(rename = "inactive", alias = "inactivo")]
    Inactive,
    #[default]
    #[serde(rename = "all", alias = "todos")]
    All,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub busqueda: Option<String>,
    #[serde(default)]
    pub estado: StatusFilter,
    pub departamento: Option<String>,
    pub ocupacion: Option<String>,
    pub tipo: Option<String>,
    pub orden: Option<String>,
    #[serde(default)]
    pub direccion: SortDirection,
    pub pagina: Option<usize>,
    pub por_pagina: Option<usize>,
}

/// Comparable value an entity exposes for a sort key.
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Text(String),
    Int(i64),
    Bool(bool),
}

impl SortValue {
    fn compare(&self, other: &SortValue) -> Ordering {
        match (self, other) {
            (SortValue::Text(a), SortValue::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
            (SortValue::Int(a), SortValue::Int(b)) => a.cmp(b),
            (SortValue::Bool(a), SortValue::Bool(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

pub trait Listable {
    fn id(&self) -> i64;

    /// Fields the free-text search looks into.
    fn search_fields(&self) -> Vec<&str>;

    fn sort_value(&self, key: &str) -> Option<SortValue>;

    /// Equality filters beyond the text search. Everything passes by default.
    fn matches_filters(&self, _query: &ListQuery) -> bool {
        true
    }
}

fn matches_search<T: Listable>(item: &T, needle: &str) -> bool {
    item.search_fields()
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}

fn eq_filter(wanted: &Option<String>, actual: &str) -> bool {
    match wanted.as_deref().map(str::trim) {
        None | Some("") => true,
        Some(w) => w.eq_ignore_ascii_case(actual),
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub pagina: usize,
    pub por_pagina: usize,
    pub total_paginas: usize,
}

/// Whole result set held in memory, patched in place after writes.
#[derive(Debug, Clone, Default)]
pub struct Collection<T> {
    items: Vec<T>,
}

impl<T: Listable + Clone> Collection<T> {
    pub fn new(items: Vec<T>) -> Self {
        Collection { items }
    }

    pub fn insert(&mut self, item: T) {
        self.items.push(item);
    }

    /// Returns false when no item carries that id.
    pub fn replace(&mut self, item: T) -> bool {
        match self.items.iter_mut().find(|existing| existing.id() == item.id()) {
            Some(slot) => {
                *slot = item;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: i64) -> Option<T> {
        let pos = self.items.iter().position(|item| item.id() == id)?;
        Some(self.items.remove(pos))
    }

    pub fn filtered(&self, query: &ListQuery) -> Vec<T> {
        let needle = query
            .busqueda
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        let mut rows: Vec<T> = self
            .items
            .iter()
            .filter(|item| needle.as_deref().map_or(true, |n| matches_search(*item, n)))
            .filter(|item| item.matches_filters(query))
            .cloned()
            .collect();

        if let Some(key) = query.orden.as_deref() {
            rows.sort_by(|a, b| {
                let ord = match (a.sort_value(key), b.sort_value(key)) {
                    (Some(x), Some(y)) => x.compare(&y),
                    _ => Ordering::Equal,
                };
                match query.direccion {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            });
        }
        rows
    }

    pub fn page(&self, query: &ListQuery) -> Page<T> {
        let rows = self.filtered(query);
        let por_pagina = query
            .por_pagina
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let pagina = query.pagina.unwrap_or(1).max(1);
        let total = rows.len();
        let total_paginas = total.div_ceil(por_pagina).max(1);

        let items = rows
            .into_iter()
            .skip((pagina - 1).saturating_mul(por_pagina))
            .take(por_pagina)
            .collect();

        Page {
            items,
            total,
            pagina,
            por_pagina,
            total_paginas,
        }
    }
}

impl Listable for Trabajador {
    fn id(&self) -> i64 {
        self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.nombres.as_str(),
            self.apellidos.as_str(),
            self.email.as_str(),
            self.ocupacion.as_str(),
            self.departamento.as_str(),
        ]
    }

    fn sort_value(&self, key: &str) -> Option<SortValue> {
        Some(match key {
            "id" => SortValue::Int(self.id),
            "nombres" => SortValue::Text(self.nombres.clone()),
            "apellidos" => SortValue::Text(self.apellidos.clone()),
            "email" => SortValue::Text(self.email.clone()),
            "ocupacion" => SortValue::Text(self.ocupacion.clone()),
            "departamento" => SortValue::Text(self.departamento.clone()),
            "ropera" => SortValue::Int(self.ropera),
            "fecha_contratacion" => SortValue::Text(self.fecha_contratacion.clone()),
            "activo" => SortValue::Bool(self.activo),
            _ => return None,
        })
    }

    fn matches_filters(&self, query: &ListQuery) -> bool {
        let status_ok = match query.estado {
            StatusFilter::Active => self.activo,
            StatusFilter::Inactive => !self.activo,
            StatusFilter::All => true,
        };
        status_ok
            && eq_filter(&query.departamento, &self.departamento)
            && eq_filter(&query.ocupacion, &self.ocupacion)
    }
}

impl Listable for FotocopiaDetalle {
    fn id(&self) -> i64 {
        self.fotocopia.id
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![
            self.fotocopia.tipo.as_str(),
            self.fotocopia.registrado_en.as_str(),
        ];
        fields.extend(self.fotocopia.comentario.as_deref());
        fields
    }

    fn sort_value(&self, key: &str) -> Option<SortValue> {
        Some(match key {
            "id" => SortValue::Int(self.fotocopia.id),
            "cantidad" => SortValue::Int(self.fotocopia.cantidad),
            "multiplicador" => SortValue::Int(self.fotocopia.multiplicador),
            "tipo" => SortValue::Text(self.fotocopia.tipo.as_str().to_owned()),
            "doble_hoja" => SortValue::Bool(self.fotocopia.doble_hoja),
            "paginas" => SortValue::Int(self.paginas),
            "hojas" => SortValue::Int(self.hojas),
            "registrado_en" => SortValue::Text(self.fotocopia.registrado_en.clone()),
            _ => return None,
        })
    }

    fn matches_filters(&self, query: &ListQuery) -> bool {
        eq_filter(&query.tipo, self.fotocopia.tipo.as_str())
    }
}

impl Listable for InventarioItem {
    fn id(&self) -> i64 {
        self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.nombre.as_str()];
        fields.extend(self.descripcion.as_deref());
        fields.extend(self.ubicacion.as_deref());
        fields
    }

    fn sort_value(&self, key: &str) -> Option<SortValue> {
        Some(match key {
            "id" => SortValue::Int(self.id),
            "nombre" => SortValue::Text(self.nombre.clone()),
            "cantidad" => SortValue::Int(self.cantidad),
            "ubicacion" => SortValue::Text(self.ubicacion.clone().unwrap_or_default()),
            "actualizado_en" => SortValue::Text(self.actualizado_en.clone()),
            _ => return None,
        })
    }
}
