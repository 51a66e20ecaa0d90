use sqlx::SqlitePool;

use crate::{
    errors::AppError,
    permisos::{Module, OWNER_ROLE},
    structs::{
        Departamento, Fotocopia, FotocopiaForm, InventarioForm, InventarioItem, Ocupacion,
        PrecioConfig, TipoHoja, Trabajador, TrabajadorForm, Usuario,
    },
    utils,
};

fn conflict_on_unique(e: sqlx::Error, msg: &str) -> AppError {
    let unique = e
        .as_database_error()
        .is_some_and(|d| d.is_unique_violation());
    if unique {
        AppError::Conflict(msg.to_owned())
    } else {
        AppError::SqlxError(e)
    }
}

fn expect_affected(rows: u64) -> Result<(), AppError> {
    if rows == 0 {
        Err(AppError::NotFound)
    } else {
        Ok(())
    }
}

// ── usuarios ──

pub async fn count_users(pool: &SqlitePool) -> Result<i64, AppError> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM usuarios")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn get_user_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Usuario>, AppError> {
    let user = sqlx::query_as::<_, Usuario>("SELECT * FROM usuarios WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn get_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<Usuario>, AppError> {
    let user = sqlx::query_as::<_, Usuario>("SELECT * FROM usuarios WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn create_user(
    pool: &SqlitePool,
    email: &str,
    nombre: &str,
    password: &str,
    rol: &str,
    es_propietario: bool,
) -> Result<Usuario, AppError> {
    let created_at = utils::now();
    let pwd_hash = utils::hash_password(password)?;
    let user = sqlx::query_as::<_, Usuario>(
        "INSERT INTO usuarios (email, nombre, pwd_hash, rol, es_propietario, activo, creado_en, actualizado_en)
         VALUES (?, ?, ?, ?, ?, 1, ?, ?) RETURNING *",
    )
    .bind(email)
    .bind(nombre)
    .bind(pwd_hash)
    .bind(rol)
    .bind(es_propietario)
    .bind(&created_at)
    .bind(&created_at)
    .fetch_one(pool)
    .await
    .map_err(|e| conflict_on_unique(e, "A user with that email already exists"))?;
    log::info!("User created: {} ({})", user.email, user.id);
    Ok(user)
}

/// Inserts the owner account only while the table is still empty, in a
/// single statement. `None` means another account got there first.
pub async fn create_first_owner(
    pool: &SqlitePool,
    email: &str,
    nombre: &str,
    password: &str,
) -> Result<Option<Usuario>, AppError> {
    let created_at = utils::now();
    let pwd_hash = utils::hash_password(password)?;
    let user = sqlx::query_as::<_, Usuario>(
        "INSERT INTO usuarios (email, nombre, pwd_hash, rol, es_propietario, activo, creado_en, actualizado_en)
         SELECT ?, ?, ?, ?, 1, 1, ?, ?
         WHERE NOT EXISTS (SELECT 1 FROM usuarios)
         RETURNING *",
    )
    .bind(email)
    .bind(nombre)
    .bind(pwd_hash)
    .bind(OWNER_ROLE)
    .bind(&created_at)
    .bind(&created_at)
    .fetch_optional(pool)
    .await?;
    if let Some(user) = &user {
        log::info!("Owner account created: {} ({})", user.email, user.id);
    }
    Ok(user)
}

// ── permisos_modulo ──

pub async fn get_module_grants(
    pool: &SqlitePool,
    usuario_id: i64,
    module: Module,
) -> Result<Vec<String>, AppError> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT permiso FROM permisos_modulo WHERE usuario_id = ? AND modulo = ? ORDER BY permiso",
    )
    .bind(usuario_id)
    .bind(module.as_str())
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(p,)| p).collect())
}

/// Replaces every grant the user holds in `module`.
pub async fn set_module_grants(
    pool: &SqlitePool,
    usuario_id: i64,
    module: Module,
    permisos: &[String],
) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM permisos_modulo WHERE usuario_id = ? AND modulo = ?")
        .bind(usuario_id)
        .bind(module.as_str())
        .execute(&mut *tx)
        .await?;
    for permiso in permisos {
        sqlx::query(
            "INSERT OR IGNORE INTO permisos_modulo (usuario_id, modulo, permiso) VALUES (?, ?, ?)",
        )
        .bind(usuario_id)
        .bind(module.as_str())
        .bind(permiso)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    log::info!(
        "Grants for user {} in {} set to {:?}",
        usuario_id,
        module.as_str(),
        permisos
    );
    Ok(())
}

// ── departamentos / ocupaciones ──

pub async fn get_all_departments(pool: &SqlitePool) -> Result<Vec<Departamento>, AppError> {
    let rows = sqlx::query_as::<_, Departamento>("SELECT * FROM departamentos ORDER BY nombre")
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn department_exists(pool: &SqlitePool, nombre: &str) -> Result<bool, AppError> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM departamentos WHERE nombre = ? COLLATE NOCASE")
            .bind(nombre)
            .fetch_one(pool)
            .await?;
    Ok(count > 0)
}

pub async fn create_department(pool: &SqlitePool, nombre: &str) -> Result<Departamento, AppError> {
    let row = sqlx::query_as::<_, Departamento>(
        "INSERT INTO departamentos (nombre, creado_en) VALUES (?, ?) RETURNING *",
    )
    .bind(nombre)
    .bind(utils::now())
    .fetch_one(pool)
    .await
    .map_err(|e| conflict_on_unique(e, "Department already exists"))?;
    log::info!("Department created: {:?}", row);
    Ok(row)
}

pub async fn update_department(
    pool: &SqlitePool,
    id: i64,
    nombre: &str,
) -> Result<Departamento, AppError> {
    sqlx::query_as::<_, Departamento>(
        "UPDATE departamentos SET nombre = ? WHERE id = ? RETURNING *",
    )
    .bind(nombre)
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| conflict_on_unique(e, "Department already exists"))?
    .ok_or(AppError::NotFound)
}

pub async fn delete_department(pool: &SqlitePool, id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM departamentos WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    expect_affected(result.rows_affected())?;
    log::info!("Department with id {} deleted", id);
    Ok(())
}

pub async fn get_all_occupations(pool: &SqlitePool) -> Result<Vec<Ocupacion>, AppError> {
    let rows = sqlx::query_as::<_, Ocupacion>("SELECT * FROM ocupaciones ORDER BY nombre")
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn occupation_exists(pool: &SqlitePool, nombre: &str) -> Result<bool, AppError> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM ocupaciones WHERE nombre = ? COLLATE NOCASE")
            .bind(nombre)
            .fetch_one(pool)
            .await?;
    Ok(count > 0)
}

pub async fn create_occupation(
    pool: &SqlitePool,
    nombre: &str,
    departamento_id: Option<i64>,
) -> Result<Ocupacion, AppError> {
    let row = sqlx::query_as::<_, Ocupacion>(
        "INSERT INTO ocupaciones (nombre, departamento_id, creado_en) VALUES (?, ?, ?) RETURNING *",
    )
    .bind(nombre)
    .bind(departamento_id)
    .bind(utils::now())
    .fetch_one(pool)
    .await
    .map_err(|e| conflict_on_unique(e, "Occupation already exists"))?;
    log::info!("Occupation created: {:?}", row);
    Ok(row)
}

pub async fn update_occupation(
    pool: &SqlitePool,
    id: i64,
    nombre: &str,
    departamento_id: Option<i64>,
) -> Result<Ocupacion, AppError> {
    sqlx::query_as::<_, Ocupacion>(
        "UPDATE ocupaciones SET nombre = ?, departamento_id = ? WHERE id = ? RETURNING *",
    )
    .bind(nombre)
    .bind(departamento_id)
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| conflict_on_unique(e, "Occupation already exists"))?
    .ok_or(AppError::NotFound)
}

pub async fn delete_occupation(pool: &SqlitePool, id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM ocupaciones WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    expect_affected(result.rows_affected())?;
    log::info!("Occupation with id {} deleted", id);
    Ok(())
}

// ── trabajadores ──

pub async fn get_all_workers(pool: &SqlitePool) -> Result<Vec<Trabajador>, AppError> {
    let rows = sqlx::query_as::<_, Trabajador>("SELECT * FROM trabajadores ORDER BY id")
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn get_worker_by_id(pool: &SqlitePool, id: i64) -> Result<Trabajador, AppError> {
    sqlx::query_as::<_, Trabajador>("SELECT * FROM trabajadores WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn create_worker(pool: &SqlitePool, form: &TrabajadorForm) -> Result<Trabajador, AppError> {
    let created_at = utils::now();
    let row = sqlx::query_as::<_, Trabajador>(
        "INSERT INTO trabajadores
         (nombres, apellidos, email, ocupacion, departamento, ropera, fecha_contratacion, activo, creado_en, actualizado_en)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING *",
    )
    .bind(form.nombres.trim())
    .bind(form.apellidos.trim())
    .bind(form.email.trim().to_lowercase())
    .bind(form.ocupacion.trim())
    .bind(form.departamento.trim())
    .bind(form.ropera)
    .bind(form.fecha_contratacion.trim())
    .bind(form.activo.unwrap_or(true))
    .bind(&created_at)
    .bind(&created_at)
    .fetch_one(pool)
    .await?;
    log::info!("Worker created: {} {} ({})", row.nombres, row.apellidos, row.id);
    Ok(row)
}

pub async fn update_worker(
    pool: &SqlitePool,
    id: i64,
    form: &TrabajadorForm,
) -> Result<Trabajador, AppError> {
    let current = get_worker_by_id(pool, id).await?;
    let row = sqlx::query_as::<_, Trabajador>(
        "UPDATE trabajadores SET nombres = ?, apellidos = ?, email = ?, ocupacion = ?, departamento = ?,
         ropera = ?, fecha_contratacion = ?, activo = ?, actualizado_en = ?
         WHERE id = ? RETURNING *",
    )
    .bind(form.nombres.trim())
    .bind(form.apellidos.trim())
    .bind(form.email.trim().to_lowercase())
    .bind(form.ocupacion.trim())
    .bind(form.departamento.trim())
    .bind(form.ropera)
    .bind(form.fecha_contratacion.trim())
    .bind(form.activo.unwrap_or(current.activo))
    .bind(utils::now())
    .bind(id)
    .fetch_one(pool)
    .await?;
    log::info!("Worker updated: {}", row.id);
    Ok(row)
}

pub async fn delete_worker(pool: &SqlitePool, id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM trabajadores WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    expect_affected(result.rows_affected())?;
    log::info!("Worker with id {} deleted", id);
    Ok(())
}

// ── tipos_hoja ──

pub async fn get_all_sheet_types(pool: &SqlitePool) -> Result<Vec<TipoHoja>, AppError> {
    let rows = sqlx::query_as::<_, TipoHoja>("SELECT * FROM tipos_hoja ORDER BY nombre")
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn sheet_type_exists(pool: &SqlitePool, id: i64) -> Result<bool, AppError> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tipos_hoja WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

pub async fn create_sheet_type(
    pool: &SqlitePool,
    nombre: &str,
    descripcion: Option<&str>,
) -> Result<TipoHoja, AppError> {
    let row = sqlx::query_as::<_, TipoHoja>(
        "INSERT INTO tipos_hoja (nombre, descripcion) VALUES (?, ?) RETURNING *",
    )
    .bind(nombre)
    .bind(descripcion)
    .fetch_one(pool)
    .await
    .map_err(|e| conflict_on_unique(e, "Sheet type already exists"))?;
    log::info!("Sheet type created: {:?}", row);
    Ok(row)
}

pub async fn delete_sheet_type(pool: &SqlitePool, id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM tipos_hoja WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    expect_affected(result.rows_affected())?;
    log::info!("Sheet type with id {} deleted", id);
    Ok(())
}

// ── fotocopias ──

pub async fn get_all_photocopies(pool: &SqlitePool) -> Result<Vec<Fotocopia>, AppError> {
    let rows = sqlx::query_as::<_, Fotocopia>("SELECT * FROM fotocopias ORDER BY registrado_en DESC, id DESC")
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Records whose registration date falls inside the inclusive `YYYY-MM-DD` bounds.
pub async fn get_photocopies_between(
    pool: &SqlitePool,
    desde: Option<&str>,
    hasta: Option<&str>,
) -> Result<Vec<Fotocopia>, AppError> {
    let rows = sqlx::query_as::<_, Fotocopia>(
        "SELECT * FROM fotocopias
         WHERE (?1 IS NULL OR date(registrado_en) >= date(?1))
           AND (?2 IS NULL OR date(registrado_en) <= date(?2))
         ORDER BY registrado_en, id",
    )
    .bind(desde)
    .bind(hasta)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn create_photocopy(
    pool: &SqlitePool,
    form: &FotocopiaForm,
    usuario_id: i64,
) -> Result<Fotocopia, AppError> {
    let row = sqlx::query_as::<_, Fotocopia>(
        "INSERT INTO fotocopias
         (cantidad, multiplicador, tipo, doble_hoja, tipo_hoja_id, comentario, usuario_id, registrado_en)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING *",
    )
    .bind(form.cantidad)
    .bind(form.multiplicador.unwrap_or(1))
    .bind(form.tipo)
    .bind(form.doble_hoja)
    .bind(form.tipo_hoja_id)
    .bind(form.comentario.as_deref().and_then(utils::trimmed))
    .bind(usuario_id)
    .bind(utils::now())
    .fetch_one(pool)
    .await?;
    log::info!("Photocopy record created: {:?}", row);
    Ok(row)
}

pub async fn update_photocopy(
    pool: &SqlitePool,
    id: i64,
    form: &FotocopiaForm,
) -> Result<Fotocopia, AppError> {
    sqlx::query_as::<_, Fotocopia>(
        "UPDATE fotocopias SET cantidad = ?, multiplicador = ?, tipo = ?, doble_hoja = ?,
         tipo_hoja_id = ?, comentario = ?
         WHERE id = ? RETURNING *",
    )
    .bind(form.cantidad)
    .bind(form.multiplicador.unwrap_or(1))
    .bind(form.tipo)
    .bind(form.doble_hoja)
    .bind(form.tipo_hoja_id)
    .bind(form.comentario.as_deref().and_then(utils::trimmed))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound)
}

pub async fn delete_photocopy(pool: &SqlitePool, id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM fotocopias WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    expect_affected(result.rows_affected())?;
    log::info!("Photocopy record with id {} deleted", id);
    Ok(())
}

// ── configuracion_precios ──

pub async fn get_prices(pool: &SqlitePool) -> Result<PrecioConfig, AppError> {
    let prices = sqlx::query_as::<_, PrecioConfig>(
        "SELECT precio_bn, precio_color, precio_hoja, fotocopia_gracia_bn, fotocopia_gracia_color
         FROM configuracion_precios WHERE id = 1",
    )
    .fetch_one(pool)
    .await?;
    Ok(prices)
}

pub async fn update_prices(pool: &SqlitePool, prices: &PrecioConfig) -> Result<PrecioConfig, AppError> {
    sqlx::query(
        "UPDATE configuracion_precios SET precio_bn = ?, precio_color = ?, precio_hoja = ?,
         fotocopia_gracia_bn = ?, fotocopia_gracia_color = ? WHERE id = 1",
    )
    .bind(prices.precio_bn)
    .bind(prices.precio_color)
    .bind(prices.precio_hoja)
    .bind(prices.fotocopia_gracia_bn)
    .bind(prices.fotocopia_gracia_color)
    .execute(pool)
    .await?;
    log::info!("Price configuration updated: {:?}", prices);
    get_prices(pool).await
}

// ── inventario ──

pub async fn get_all_inventory(pool: &SqlitePool) -> Result<Vec<InventarioItem>, AppError> {
    let rows = sqlx::query_as::<_, InventarioItem>("SELECT * FROM inventario ORDER BY id")
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn create_inventory_item(
    pool: &SqlitePool,
    form: &InventarioForm,
) -> Result<InventarioItem, AppError> {
    let created_at = utils::now();
    let row = sqlx::query_as::<_, InventarioItem>(
        "INSERT INTO inventario (nombre, descripcion, cantidad, ubicacion, creado_en, actualizado_en)
         VALUES (?, ?, ?, ?, ?, ?) RETURNING *",
    )
    .bind(form.nombre.trim())
    .bind(form.descripcion.as_deref().and_then(utils::trimmed))
    .bind(form.cantidad)
    .bind(form.ubicacion.as_deref().and_then(utils::trimmed))
    .bind(&created_at)
    .bind(&created_at)
    .fetch_one(pool)
    .await?;
    log::info!("Inventory item created: {:?}", row);
    Ok(row)
}

pub async fn update_inventory_item(
    pool: &SqlitePool,
    id: i64,
    form: &InventarioForm,
) -> Result<InventarioItem, AppError> {
    sqlx::query_as::<_, InventarioItem>(
        "UPDATE inventario SET nombre = ?, descripcion = ?, cantidad = ?, ubicacion = ?, actualizado_en = ?
         WHERE id = ? RETURNING *",
    )
    .bind(form.nombre.trim())
    .bind(form.descripcion.as_deref().and_then(utils::trimmed))
    .bind(form.cantidad)
    .bind(form.ubicacion.as_deref().and_then(utils::trimmed))
    .bind(utils::now())
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound)
}

pub async fn delete_inventory_item(pool: &SqlitePool, id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM inventario WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    expect_affected(result.rows_affected())?;
    log::info!("Inventory item with id {} deleted", id);
    Ok(())
}
