use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

use crate::utils::deserialize_truthy;

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct Usuario {
    pub id: i64,
    pub email: String,
    pub nombre: String,
    #[serde(skip_serializing, default)]
    pub pwd_hash: String,
    pub rol: String,
    pub rol_global: Option<String>,
    #[serde(deserialize_with = "deserialize_truthy", default)]
    pub es_propietario: bool,
    pub activo: bool,
    pub creado_en: String,
    pub actualizado_en: String,
}

#[derive(Deserialize, Debug)]
pub struct RegistroForm {
    pub email: String,
    pub nombre: String,
    pub password: String,
    pub password2: String,
    pub rol: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, FromRow)]
pub struct Trabajador {
    pub id: i64,
    pub nombres: String,
    pub apellidos: String,
    pub email: String,
    pub ocupacion: String,
    pub departamento: String,
    pub ropera: i64,
    pub fecha_contratacion: String,
    pub activo: bool,
    pub creado_en: String,
    pub actualizado_en: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TrabajadorForm {
    pub nombres: String,
    pub apellidos: String,
    pub email: String,
    pub ocupacion: String,
    pub departamento: String,
    pub ropera: i64,
    pub fecha_contratacion: String,
    pub activo: Option<bool>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, FromRow)]
pub struct Departamento {
    pub id: i64,
    pub nombre: String,
    pub creado_en: String,
}

#[derive(Deserialize, Debug)]
pub struct DepartamentoForm {
    pub nombre: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, FromRow)]
pub struct Ocupacion {
    pub id: i64,
    pub nombre: String,
    pub departamento_id: Option<i64>,
    pub creado_en: String,
}

#[derive(Deserialize, Debug)]
pub struct OcupacionForm {
    pub nombre: String,
    pub departamento_id: Option<i64>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, FromRow)]
pub struct TipoHoja {
    pub id: i64,
    pub nombre: String,
    pub descripcion: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct TipoHojaForm {
    pub nombre: String,
    pub descripcion: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum TipoCopia {
    Bn,
    Color,
}

impl TipoCopia {
    pub fn as_str(&self) -> &'static str {
        match self {
            TipoCopia::Bn => "bn",
            TipoCopia::Color => "color",
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, FromRow)]
pub struct Fotocopia {
    pub id: i64,
    pub cantidad: i64,
    pub multiplicador: i64,
    pub tipo: TipoCopia,
    pub doble_hoja: bool,
    pub tipo_hoja_id: Option<i64>,
    pub comentario: Option<String>,
    pub usuario_id: i64,
    pub registrado_en: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct FotocopiaForm {
    pub cantidad: i64,
    pub multiplicador: Option<i64>,
    pub tipo: TipoCopia,
    #[serde(default)]
    pub doble_hoja: bool,
    pub tipo_hoja_id: Option<i64>,
    pub comentario: Option<String>,
}

/// List row: the stored record plus the figures derived from it.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct FotocopiaDetalle {
    #[serde(flatten)]
    pub fotocopia: Fotocopia,
    pub paginas: i64,
    pub hojas: i64,
}

/// Loose input for the live calculator; see `utils::coerce_int`.
#[derive(Deserialize, Debug, Default)]
pub struct CalculoForm {
    #[serde(default)]
    pub cantidad: Value,
    #[serde(default)]
    pub multiplicador: Value,
    #[serde(default)]
    pub doble_hoja: Value,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, FromRow)]
pub struct PrecioConfig {
    pub precio_bn: f64,
    pub precio_color: f64,
    pub precio_hoja: f64,
    pub fotocopia_gracia_bn: i64,
    pub fotocopia_gracia_color: i64,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, FromRow)]
pub struct InventarioItem {
    pub id: i64,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub cantidad: i64,
    pub ubicacion: Option<String>,
    pub creado_en: String,
    pub actualizado_en: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct InventarioForm {
    pub nombre: String,
    pub descripcion: Option<String>,
    pub cantidad: i64,
    pub ubicacion: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct RangoFechas {
    pub desde: Option<String>,
    pub hasta: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn usuario_accepts_numeric_owner_flag() {
        let user: Usuario = serde_json::from_value(json!({
            "id": 3,
            "email": "dueno@example.com",
            "nombre": "Dueno",
            "rol": "empleado",
            "rol_global": null,
            "es_propietario": 1,
            "activo": true,
            "creado_en": "2025-01-01T00:00:00Z",
            "actualizado_en": "2025-01-01T00:00:00Z"
        }))
        .unwrap();
        assert!(user.es_propietario);
        assert!(serde_json::to_value(&user).unwrap().get("pwd_hash").is_none());
    }

    #[test]
    fn detalle_flattens_record() {
        let detalle = FotocopiaDetalle {
            fotocopia: Fotocopia {
                id: 1,
                cantidad: 9,
                multiplicador: 10,
                tipo: TipoCopia::Bn,
                doble_hoja: true,
                tipo_hoja_id: None,
                comentario: None,
                usuario_id: 1,
                registrado_en: "2025-03-01T10:00:00Z".into(),
            },
            paginas: 90,
            hojas: 50,
        };
        let value = serde_json::to_value(&detalle).unwrap();
        assert_eq!(value["tipo"], "bn");
        assert_eq!(value["hojas"], 50);
        assert_eq!(value["cantidad"], 9);
    }
}
