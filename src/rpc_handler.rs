//! RPC method handler for the Shelfmark JSON-RPC protocol.
//!
//! Kept apart from `rpc_server.rs` so it can be tested without stdio.
//! `handle_method` dispatches one call against the session and returns the
//! JSON result or an error message.

use serde::Serialize;
use serde_json::{json, Value};

use crate::app::App;
use crate::managers::drop_manager::DropZone;
use crate::services::export::ExportFormat;
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::types::bookmark::BookmarkDraft;
use crate::types::view::SortKey;

/// State shared by every call: the session and the settings file behind it.
pub struct RpcContext {
    pub app: App,
    pub settings: SettingsEngine,
}

impl RpcContext {
    pub fn new(app: App, settings: SettingsEngine) -> Self {
        Self { app, settings }
    }
}

fn to_json<T: Serialize>(value: T) -> Result<Value, String> {
    serde_json::to_value(value).map_err(|e| e.to_string())
}

fn str_param<'a>(params: &'a Value, key: &str) -> Result<&'a str, String> {
    params
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("missing {}", key))
}

fn opt_str<'a>(params: &'a Value, key: &str) -> Option<&'a str> {
    params.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Destructive calls must carry `"confirm": true`.
fn require_confirm(params: &Value) -> Result<(), String> {
    match params.get("confirm").and_then(Value::as_bool) {
        Some(true) => Ok(()),
        _ => Err("confirmation required".to_string()),
    }
}

/// `zone` by name, else from `offset_y` within `height`, else `after`.
fn zone_param(params: &Value) -> Result<DropZone, String> {
    if let Some(name) = params.get("zone").and_then(Value::as_str) {
        return DropZone::from_name(name).ok_or_else(|| format!("invalid zone: {}", name));
    }
    let offset = params.get("offset_y").and_then(Value::as_f64);
    let height = params.get("height").and_then(Value::as_f64);
    Ok(match (offset, height) {
        (Some(y), Some(h)) => DropZone::from_pointer(y, h),
        _ => DropZone::default(),
    })
}

fn draft_param(params: &Value) -> Result<BookmarkDraft, String> {
    let tags = match params.get("tags") {
        Some(Value::String(raw)) => BookmarkDraft::parse_tags(raw),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };
    Ok(BookmarkDraft {
        title: opt_str(params, "title").unwrap_or_default().to_string(),
        url: str_param(params, "url")?.to_string(),
        description: opt_str(params, "description").unwrap_or_default().to_string(),
        category: opt_str(params, "category").unwrap_or_default().to_string(),
        tags,
    })
}

/// Dispatches one JSON-RPC call.
pub async fn handle_method(ctx: &mut RpcContext, method: &str, params: &Value) -> Result<Value, String> {
    let app = &mut ctx.app;
    match method {
        "ping" => Ok(json!({"pong": true})),

        // ─── Session ───
        "state.load" => to_json(app.load().await),
        "state.flush" => to_json(app.flush().await),
        "state.pending" => Ok(json!({"pending": app.pending_writes().count()})),
        "state.migrate_local" => {
            let count = app.migrate_local_to_remote().await.map_err(|e| e.to_string())?;
            Ok(json!({"migrated": count}))
        }
        "state.clear" => {
            require_confirm(params)?;
            app.clear_all().map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }

        // ─── Categories ───
        "category.tree" => to_json(app.category_tree().map_err(|e| e.to_string())?),
        "category.flat" => to_json(app.flat_categories().map_err(|e| e.to_string())?),
        "category.add" => {
            let name = str_param(params, "name")?;
            to_json(app.add_category(name))
        }
        "category.rename" => {
            let id = str_param(params, "id")?;
            let name = str_param(params, "name")?;
            app.rename_category(id, name).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "category.toggle" => {
            let id = str_param(params, "id")?;
            let expanded = app.toggle_category(id).map_err(|e| e.to_string())?;
            Ok(json!({"expanded": expanded}))
        }
        "category.delete" => {
            let id = str_param(params, "id")?;
            require_confirm(params)?;
            to_json(app.delete_category(id).map_err(|e| e.to_string())?)
        }
        "category.move" => {
            let source = str_param(params, "source")?;
            let target = str_param(params, "target")?;
            let zone = zone_param(params)?;
            app.move_category(source, target, zone).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "category.counts" => to_json(app.selected_category_counts()),

        // ─── Bookmarks ───
        "bookmark.page" => to_json(app.current_page()),
        "bookmark.save" => {
            let draft = draft_param(params)?;
            let editing = opt_str(params, "id");
            to_json(app.save_bookmark(draft, editing).map_err(|e| e.to_string())?)
        }
        "bookmark.delete" => {
            let id = str_param(params, "id")?;
            require_confirm(params)?;
            app.delete_bookmark(id).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "bookmark.visit" => {
            let url = str_param(params, "url")?;
            to_json(app.visit(url))
        }
        "bookmark.click" => {
            let id = str_param(params, "id")?;
            to_json(app.click_bookmark(id).map_err(|e| e.to_string())?)
        }
        "bookmark.reorder" => {
            let dragged = str_param(params, "dragged")?;
            let target = str_param(params, "target")?;
            Ok(json!({"moved": app.reorder_bookmark(dragged, target)}))
        }
        "bookmark.tags" => to_json(app.popular_tags()),

        // ─── View ───
        "view.get" => to_json(&app.view),
        "view.select_category" => {
            app.select_category(opt_str(params, "id"));
            to_json(&app.view)
        }
        "view.search" => {
            app.set_search(params.get("query").and_then(Value::as_str).unwrap_or_default());
            to_json(&app.view)
        }
        "view.sort" => {
            app.set_sort(SortKey::from_name(str_param(params, "key")?));
            to_json(&app.view)
        }
        "view.page" => {
            let page = params.get("page").and_then(Value::as_u64).ok_or("missing page")?;
            Ok(json!({"page": app.set_page(page as usize)}))
        }

        // ─── Selection ───
        "selection.get" => Ok(json!({"bulkMode": app.selection.bulk_mode(), "ids": app.selection.ids()})),
        "selection.bulk_mode" => Ok(json!({"bulkMode": app.toggle_bulk_mode()})),
        "selection.toggle" => {
            let id = str_param(params, "id")?;
            Ok(json!({"selected": app.toggle_selection(id)}))
        }
        "selection.page" => {
            app.select_all_on_page();
            Ok(json!({"ids": app.selection.ids()}))
        }
        "selection.clear" => {
            app.clear_selection();
            Ok(json!({"ok": true}))
        }
        "selection.delete" => {
            require_confirm(params)?;
            let count = app.bulk_delete().map_err(|e| e.to_string())?;
            Ok(json!({"deleted": count}))
        }
        "selection.move" => {
            let category = params.get("category").and_then(Value::as_str).unwrap_or_default();
            let count = app.bulk_move(category).map_err(|e| e.to_string())?;
            Ok(json!({"moved": count}))
        }

        // ─── Drag and drop ───
        "drop" => {
            let target = str_param(params, "target")?;
            let data = str_param(params, "data")?;
            let zone = zone_param(params)?;
            to_json(app.drop_on_category(target, data, zone).map_err(|e| e.to_string())?)
        }

        // ─── Undo ───
        "undo" => Ok(json!({"undone": app.undo()})),
        "undo.toast" => to_json(app.undo_toast()),

        // ─── Import / export ───
        "import.json" => {
            let content = str_param(params, "content")?;
            to_json(app.import_json(content).map_err(|e| e.to_string())?)
        }
        "export" => {
            let name = str_param(params, "format")?;
            let format = ExportFormat::from_name(name).ok_or_else(|| format!("unknown format: {}", name))?;
            let (filename, content) = app.export(format).map_err(|e| e.to_string())?;
            Ok(json!({"filename": filename, "content": content}))
        }
        "backup" => {
            let (filename, content) = app.backup().map_err(|e| e.to_string())?;
            Ok(json!({"filename": filename, "content": content}))
        }

        // ─── Settings ───
        "settings.get" => to_json(ctx.settings.get_settings()),
        "settings.set" => {
            let key = str_param(params, "key")?;
            let value = params.get("value").cloned().ok_or("missing value")?;
            ctx.settings.set_value(key, value).map_err(|e| e.to_string())?;
            app.apply_settings(ctx.settings.get_settings().clone());
            Ok(json!({"ok": true}))
        }
        "settings.reset" => {
            require_confirm(params)?;
            ctx.settings.reset().map_err(|e| e.to_string())?;
            app.apply_settings(ctx.settings.get_settings().clone());
            Ok(json!({"ok": true}))
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}
