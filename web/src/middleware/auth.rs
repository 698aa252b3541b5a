use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use super::locale::is_bypassed;
use crate::models::PageOutcome;
use crate::services::PageService;
use crate::utils::ApiError;

/// Session gate for page routes.
/// 1. 解析路径语言并加载字典
/// 2. 等待会话恢复完成后检查登录状态
/// 3. 受保护页面无会话时重定向到 `/{locale}/login`，不调用页面处理函数
///
/// On success the mounted [`PageView`](crate::models::PageView) is placed in the
/// request extensions for the page handler.
pub async fn page_gate_middleware(
    State(pages): State<Arc<PageService>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let path = req.uri().path().to_string();
    tracing::debug!("Page gate processing: {}", path);

    // Reserved prefixes such as /api are never pages
    if is_bypassed(&path) {
        return Err(ApiError::not_found(path));
    }

    match pages.mount(&path).await? {
        PageOutcome::Redirect(target) => Ok(Redirect::to(&target).into_response()),
        PageOutcome::Render(view) => {
            req.extensions_mut().insert(Arc::new(*view));
            Ok(next.run(req).await)
        },
    }
}
