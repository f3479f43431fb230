use cabinet_api::roles::{format_role_date, status_badge};
use core_types::{Department, Role};
use i18n::I18n;
use maud::html;

pub fn role_rows_html(i18n: &I18n, roles: &[Role]) -> String {
    let markup = if roles.is_empty() {
        html! {
            tr {
                td colspan="5" class="text-center py-4" {
                    div class="text-muted" {
                        i class="ti ti-users-off fs-48 mb-3 d-block" {}
                        p class="mb-0" { (i18n.t("role.empty")) }
                        small { (i18n.t("role.empty_hint")) }
                    }
                }
            }
        }
    } else {
        html! {
            @for role in roles {
                tr {
                    td { (role.name) }
                    td { (role.description.as_deref().filter(|text| !text.is_empty()).unwrap_or("N/A")) }
                    td { (status_badge(&role.status)) }
                    td { (format_role_date(role.created_at.as_deref())) }
                    td class="text-end" {
                        a class="dropdown-item edit-role" data-role-id=(role.id) { (i18n.t("role.edit")) }
                        a class="dropdown-item text-danger delete-role" data-role-id=(role.id) { (i18n.t("role.delete")) }
                    }
                }
            }
        }
    };
    markup.into_string()
}

pub fn department_options_html(placeholder: &str, departments: &[Department]) -> String {
    html! {
        option value="" { (placeholder) }
        @for department in departments {
            option value=(department.id) { (department.name) }
        }
    }
    .into_string()
}
