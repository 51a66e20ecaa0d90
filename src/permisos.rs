//! Flat permission tokens: owner override plus per-module capability grants.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::{db, errors::AppError, structs::Usuario};

pub const OWNER_ROLE: &str = "propietario";

/// Granted to every signed-in user until these areas get their own module checks.
pub const ALWAYS_ON: [&str; 2] = ["graficos", "ubicaciones"];

/// Only reachable through the owner override.
pub const OWNER_ONLY: [&str; 2] = ["configuracion", "usuarios"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Module {
    Inventario,
    Fotocopias,
    Trabajadores,
}

/// (module, capability reported by the module check, token it grants)
const CAPABILITY_TOKENS: [(Module, &str, &str); 12] = [
    (Module::Inventario, "inventario_leer", "inventario_ver"),
    (Module::Inventario, "inventario_escribir", "inventario_crear"),
    (Module::Inventario, "inventario_editar", "inventario_editar"),
    (Module::Inventario, "inventario_eliminar", "inventario_eliminar"),
    (Module::Fotocopias, "fotocopia_leer", "fotocopias_ver"),
    (Module::Fotocopias, "fotocopia_escribir", "fotocopias_crear"),
    (Module::Fotocopias, "fotocopia_editar", "fotocopias_editar"),
    (Module::Fotocopias, "fotocopia_eliminar", "fotocopias_eliminar"),
    (Module::Trabajadores, "trabajador_leer", "trabajadores_ver"),
    (Module::Trabajadores, "trabajador_escribir", "trabajadores_crear"),
    (Module::Trabajadores, "trabajador_editar", "trabajadores_editar"),
    (Module::Trabajadores, "trabajador_eliminar", "trabajadores_eliminar"),
];

impl Module {
    pub const ALL: [Module; 3] = [Module::Inventario, Module::Fotocopias, Module::Trabajadores];

    pub fn as_str(&self) -> &'static str {
        match self {
            Module::Inventario => "inventario",
            Module::Fotocopias => "fotocopias",
            Module::Trabajadores => "trabajadores",
        }
    }

    pub fn parse(raw: &str) -> Option<Module> {
        Module::ALL.into_iter().find(|m| m.as_str() == raw)
    }

    pub fn token_for(&self, capability: &str) -> Option<&'static str> {
        CAPABILITY_TOKENS
            .iter()
            .find(|(module, cap, _)| module == self && *cap == capability)
            .map(|(_, _, token)| *token)
    }

    pub fn capabilities(&self) -> impl Iterator<Item = &'static str> + '_ {
        CAPABILITY_TOKENS
            .iter()
            .filter(move |(module, _, _)| module == self)
            .map(|(_, cap, _)| *cap)
    }
}

/// Wire shape of a module permission check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleAccess {
    #[serde(rename = "hasAccess", default)]
    pub has_access: bool,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Answers "what may this user do in this module".
pub trait ModuleSource {
    async fn check(&self, usuario_id: i64, module: Module) -> Result<ModuleAccess, AppError>;
}

/// Module checks backed by the `permisos_modulo` table.
pub struct DbModuleSource<'a> {
    pub pool: &'a SqlitePool,
}

impl ModuleSource for DbModuleSource<'_> {
    async fn check(&self, usuario_id: i64, module: Module) -> Result<ModuleAccess, AppError> {
        let permissions = db::get_module_grants(self.pool, usuario_id, module).await?;
        Ok(ModuleAccess {
            has_access: !permissions.is_empty(),
            permissions,
        })
    }
}

pub fn is_owner(user: &Usuario) -> bool {
    user.rol_global.as_deref() == Some(OWNER_ROLE) || user.rol == OWNER_ROLE || user.es_propietario
}

pub fn full_permission_set() -> BTreeSet<String> {
    Module::ALL
        .iter()
        .map(|m| m.as_str())
        .chain(CAPABILITY_TOKENS.iter().map(|(_, _, token)| *token))
        .chain(ALWAYS_ON)
        .chain(OWNER_ONLY)
        .map(str::to_owned)
        .collect()
}

fn apply_module(set: &mut BTreeSet<String>, module: Module, access: &ModuleAccess) {
    if !access.has_access {
        return;
    }
    set.insert(module.as_str().to_owned());
    for capability in &access.permissions {
        match module.token_for(capability) {
            Some(token) => {
                set.insert(token.to_owned());
            }
            None => log::warn!(
                "Ignoring unknown capability '{}' for module {}",
                capability,
                module.as_str()
            ),
        }
    }
}

pub async fn resolve_permissions<S: ModuleSource>(user: &Usuario, source: &S) -> BTreeSet<String> {
    if is_owner(user) {
        return full_permission_set();
    }

    let (inventario, fotocopias, trabajadores) = tokio::join!(
        source.check(user.id, Module::Inventario),
        source.check(user.id, Module::Fotocopias),
        source.check(user.id, Module::Trabajadores),
    );

    let mut set = BTreeSet::new();
    for (module, result) in [
        (Module::Inventario, inventario),
        (Module::Fotocopias, fotocopias),
        (Module::Trabajadores, trabajadores),
    ] {
        match result {
            Ok(access) => apply_module(&mut set, module, &access),
            Err(e) => log::warn!(
                "Permission check for module {} failed for user {}: {}",
                module.as_str(),
                user.id,
                e
            ),
        }
    }

    set.extend(ALWAYS_ON.iter().map(|t| (*t).to_owned()));
    set
}

pub fn validate_capabilities(module: Module, capabilities: &[String]) -> Result<(), AppError> {
    match capabilities.iter().find(|c| module.token_for(c).is_none()) {
        Some(unknown) => Err(AppError::validation(format!(
            "'{}' is not a capability of module {}; expected one of: {}",
            unknown,
            module.as_str(),
            module.capabilities().collect::<Vec<_>>().join(", ")
        ))),
        None => Ok(()),
    }
}

/// Permission set tied to the user it was resolved for. Starts out loading,
/// and only re-resolves when a different user (or a changed one) shows up.
#[derive(Debug, Clone, Serialize)]
pub struct PermissionState {
    pub loading: bool,
    #[serde(rename = "permisos")]
    pub permissions: BTreeSet<String>,
    #[serde(skip)]
    resolved_for: Option<(i64, String)>,
}

impl Default for PermissionState {
    fn default() -> Self {
        PermissionState {
            loading: true,
            permissions: BTreeSet::new(),
            resolved_for: None,
        }
    }
}

impl PermissionState {
    pub async fn refresh<S: ModuleSource>(&mut self, user: Option<&Usuario>, source: &S) {
        let Some(user) = user else {
            self.permissions.clear();
            self.resolved_for = None;
            self.loading = false;
            return;
        };

        let key = (user.id, user.actualizado_en.clone());
        if !self.loading && self.resolved_for.as_ref() == Some(&key) {
            return;
        }

        self.loading = true;
        self.permissions = resolve_permissions(user, source).await;
        self.resolved_for = Some(key);
        self.loading = false;
    }

    pub fn has(&self, token: &str) -> bool {
        self.permissions.contains(token)
    }
}
