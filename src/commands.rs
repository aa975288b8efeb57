use serde::Serialize;
use tauri::{Emitter, Manager, State};

use crate::cart::CartItem;
use crate::catalog::CatalogView;
use crate::consultation::{build_handoff, ConsultationHandoff};
use crate::models::{ProductDraft, ProductSummary};
use crate::AppState;

const CATALOG_VIEW_EVENT: &str = "catalog://view";

#[derive(Serialize, Clone)]
#[serde(rename_all = "camelCase")]
struct AuthStatusDto {
  authenticated: bool,
}

#[tauri::command]
async fn catalog_mount(state: State<'_, AppState>, query: String) -> Result<CatalogView, String> {
  Ok(state.catalog.mount(&query).await)
}

#[tauri::command]
fn catalog_unmount(state: State<'_, AppState>) {
  state.catalog.unmount();
}

#[tauri::command]
fn catalog_view(state: State<'_, AppState>) -> CatalogView {
  state.catalog.view()
}

#[tauri::command]
async fn catalog_set_category(
  state: State<'_, AppState>,
  slug: Option<String>,
) -> Result<CatalogView, String> {
  Ok(state.catalog.on_category_change(slug).await)
}

#[tauri::command]
async fn catalog_set_collection(
  state: State<'_, AppState>,
  slug: Option<String>,
) -> Result<CatalogView, String> {
  Ok(state.catalog.on_collection_change(slug).await)
}

// Async so the debounce timer is spawned on the tokio runtime.
#[tauri::command]
async fn catalog_set_search(state: State<'_, AppState>, text: String) -> Result<CatalogView, String> {
  Ok(state.catalog.on_search_change(text))
}

#[tauri::command]
async fn catalog_set_stock_filter(
  state: State<'_, AppState>,
  in_stock_only: bool,
) -> Result<CatalogView, String> {
  Ok(state.catalog.on_stock_filter_change(in_stock_only).await)
}

#[tauri::command]
async fn catalog_clear_filters(state: State<'_, AppState>) -> Result<CatalogView, String> {
  Ok(state.catalog.on_clear_filters().await)
}

#[tauri::command]
async fn catalog_go_to_page(state: State<'_, AppState>, page: u32) -> Result<CatalogView, String> {
  Ok(state.catalog.go_to_page(page).await)
}

#[tauri::command]
async fn catalog_next_page(state: State<'_, AppState>) -> Result<CatalogView, String> {
  Ok(state.catalog.next_page().await)
}

#[tauri::command]
async fn catalog_previous_page(state: State<'_, AppState>) -> Result<CatalogView, String> {
  Ok(state.catalog.previous_page().await)
}

#[tauri::command]
async fn catalog_location_changed(
  state: State<'_, AppState>,
  query: String,
) -> Result<CatalogView, String> {
  Ok(state.catalog.on_location_change(&query).await)
}

#[tauri::command]
fn cart_items(state: State<'_, AppState>) -> Vec<CartItem> {
  state.cart.items()
}

#[tauri::command]
fn cart_add(state: State<'_, AppState>, product: ProductSummary) -> Result<Vec<CartItem>, String> {
  state
    .cart
    .add(CartItem::from_product(&product))
    .map_err(|e| e.to_string())?;
  Ok(state.cart.items())
}

#[tauri::command]
fn cart_remove(state: State<'_, AppState>, product_id: String) -> Result<Vec<CartItem>, String> {
  state.cart.remove(&product_id).map_err(|e| e.to_string())?;
  Ok(state.cart.items())
}

#[tauri::command]
fn cart_clear(state: State<'_, AppState>) -> Result<(), String> {
  state.cart.clear().map_err(|e| e.to_string())
}

#[tauri::command]
fn cart_contains(state: State<'_, AppState>, product_id: String) -> bool {
  state.cart.contains(&product_id)
}

#[tauri::command]
fn cart_count(state: State<'_, AppState>) -> usize {
  state.cart.count()
}

#[tauri::command]
fn consultation_handoff(state: State<'_, AppState>) -> Result<ConsultationHandoff, String> {
  build_handoff(&state.config, &state.cart.items()).map_err(|e| e.to_string())
}

#[tauri::command]
async fn auth_login(
  state: State<'_, AppState>,
  username: String,
  password: String,
) -> Result<AuthStatusDto, String> {
  state
    .auth
    .login(&username, &password)
    .await
    .map_err(|e| e.to_string())?;
  Ok(AuthStatusDto { authenticated: true })
}

#[tauri::command]
fn auth_logout(state: State<'_, AppState>) -> Result<AuthStatusDto, String> {
  state.auth.logout().map_err(|e| e.to_string())?;
  Ok(AuthStatusDto { authenticated: false })
}

#[tauri::command]
fn auth_status(state: State<'_, AppState>) -> AuthStatusDto {
  AuthStatusDto {
    authenticated: state.auth.is_authenticated(),
  }
}

#[tauri::command]
async fn admin_create_product(
  state: State<'_, AppState>,
  draft: ProductDraft,
) -> Result<ProductSummary, String> {
  state.admin.create_product(&draft).await.map_err(|e| e.to_string())
}

#[tauri::command]
async fn admin_update_product(
  state: State<'_, AppState>,
  product_id: String,
  draft: ProductDraft,
) -> Result<ProductSummary, String> {
  state
    .admin
    .update_product(&product_id, &draft)
    .await
    .map_err(|e| e.to_string())
}

#[tauri::command]
async fn admin_delete_product(state: State<'_, AppState>, product_id: String) -> Result<(), String> {
  state
    .admin
    .delete_product(&product_id)
    .await
    .map_err(|e| e.to_string())
}

pub(crate) fn run() {
  tauri::Builder::default()
    .setup(|app| {
      if cfg!(debug_assertions) {
        app.handle().plugin(
          tauri_plugin_log::Builder::default()
            .level(log::LevelFilter::Info)
            .build(),
        )?;
      }

      let app_data_dir = app.path().app_data_dir()?;
      let state = AppState::initialize(&app_data_dir)
        .map_err(|error| std::io::Error::new(std::io::ErrorKind::Other, error.to_string()))?;

      let mut views = state.catalog.subscribe();
      let handle = app.handle().clone();
      tauri::async_runtime::spawn(async move {
        while views.changed().await.is_ok() {
          let view = views.borrow_and_update().clone();
          if let Err(e) = handle.emit(CATALOG_VIEW_EVENT, view) {
            log::warn!("Could not emit catalog view: {}", e);
          }
        }
      });

      app.manage(state);
      Ok(())
    })
    .invoke_handler(tauri::generate_handler![
      catalog_mount,
      catalog_unmount,
      catalog_view,
      catalog_set_category,
      catalog_set_collection,
      catalog_set_search,
      catalog_set_stock_filter,
      catalog_clear_filters,
      catalog_go_to_page,
      catalog_next_page,
      catalog_previous_page,
      catalog_location_changed,
      cart_items,
      cart_add,
      cart_remove,
      cart_clear,
      cart_contains,
      cart_count,
      consultation_handoff,
      auth_login,
      auth_logout,
      auth_status,
      admin_create_product,
      admin_update_product,
      admin_delete_product
    ])
    .run(tauri::generate_context!())
    .expect("error while running tauri application");
}
