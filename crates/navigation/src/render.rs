use core_types::{BreadcrumbItem, NavCategory};
use maud::{Markup, html};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavLink {
    pub href: String,
    pub text: String,
    pub data_route: String,
    pub class_name: Option<String>,
    pub active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct NavLinkOptions {
    pub class_name: Option<String>,
    pub active: bool,
}

impl NavLink {
    pub fn class_attr(&self) -> Option<String> {
        match (self.class_name.as_deref(), self.active) {
            (Some(class), true) if !class.is_empty() => Some(format!("{class} active")),
            (Some(class), false) if !class.is_empty() => Some(class.to_string()),
            (_, true) => Some("active".to_string()),
            _ => None,
        }
    }

    pub fn markup(&self) -> Markup {
        html! {
            a href=(self.href) class=[self.class_attr()] data-route=(self.data_route) {
                (self.text)
            }
        }
    }
}

pub fn breadcrumb_markup(base_path: &str, items: &[BreadcrumbItem]) -> Markup {
    html! {
        nav aria-label="breadcrumb" {
            ol class="breadcrumb" {
                @for item in items {
                    @if item.active {
                        li class="breadcrumb-item active" aria-current="page" { (item.title) }
                    } @else {
                        li class="breadcrumb-item" {
                            a href={ (base_path) (item.route) } { (item.title) }
                        }
                    }
                }
            }
        }
    }
}

pub fn navigation_markup(base_path: &str, menu: &[NavCategory]) -> Markup {
    html! {
        @for category in menu {
            div class="nav-category" {
                h6 class="nav-category-title" { (category.name) }
                ul class="nav-category-list" {
                    @for page in &category.pages {
                        li class=(if page.is_active { "nav-item active" } else { "nav-item" }) {
                            a href={ (base_path) (page.route) }
                                class="nav-link"
                                data-route=(page.route)
                                title=(page.description) {
                                (page.title)
                            }
                        }
                    }
                }
            }
        }
    }
}
