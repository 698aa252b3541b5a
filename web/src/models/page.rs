use serde::Serialize;
use utoipa::ToSchema;

use super::{Dictionary, Locale, User};

/// Sidebar entries in display order.
pub const NAV_PAGES: &[&str] = &[
    "dashboard",
    "categories",
    "transactions",
    "budgets",
    "account",
    "saving",
    "loan",
    "transfer",
    "users",
    "about",
];

/// Pages reachable without a session unless configuration says otherwise.
pub const DEFAULT_PUBLIC_PAGES: &[&str] = &[
    "login", "register", "pricing", "features", "privacy", "terms", "about", "security",
];

pub const HOME_PAGE: &str = "home";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RouteClass {
    Public,
    Protected,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NavItem {
    pub key: String,
    pub label: String,
    pub href: String,
    pub active: bool,
}

/// Everything a renderer needs to draw one page.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PageView {
    #[schema(value_type = String)]
    pub locale: Locale,
    pub page: String,
    pub path: String,
    pub access: RouteClass,
    #[schema(value_type = Object)]
    pub dictionary: Dictionary,
    pub user: Option<User>,
    pub navigation: Vec<NavItem>,
}

#[derive(Debug)]
pub enum PageOutcome {
    Render(Box<PageView>),
    Redirect(String),
}
