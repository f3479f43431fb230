use std::collections::BTreeMap;

use core_types::UiLanguage;

#[derive(Debug, Clone)]
pub struct I18n {
    lang: UiLanguage,
    fr_fr: BTreeMap<&'static str, &'static str>,
    en_us: BTreeMap<&'static str, &'static str>,
}

impl I18n {
    pub fn new(lang: UiLanguage) -> Self {
        Self {
            lang,
            fr_fr: fr_fr_map(),
            en_us: en_us_map(),
        }
    }

    pub fn set_language(&mut self, lang: UiLanguage) {
        self.lang = lang;
    }

    pub fn language(&self) -> UiLanguage {
        self.lang
    }

    pub fn t<'a>(&'a self, key: &'a str) -> &'a str {
        let (primary, fallback) = match self.lang {
            UiLanguage::FrFr => (&self.fr_fr, &self.en_us),
            UiLanguage::EnUs => (&self.en_us, &self.fr_fr),
        };
        primary
            .get(key)
            .or_else(|| fallback.get(key))
            .copied()
            .unwrap_or(key)
    }

    pub fn format(&self, key: &str, args: &[(&str, &str)]) -> String {
        args.iter()
            .fold(self.t(key).to_string(), |text, (name, value)| {
                text.replace(&format!("{{{name}}}"), value)
            })
    }
}

fn fr_fr_map() -> BTreeMap<&'static str, &'static str> {
    BTreeMap::from([
        ("app.title", "Gestion du cabinet"),
        ("alert.success", "Succès !"),
        ("alert.error", "Erreur !"),
        ("header.default_name", "Utilisateur"),
        ("header.default_role", "Utilisateur"),
        ("header.guest", "Invité"),
        (
            "login.missing_fields",
            "Veuillez saisir à la fois le nom d'utilisateur et le mot de passe pour continuer.",
        ),
        (
            "login.welcome",
            "Bon retour, {name} ! Redirection vers votre tableau de bord...",
        ),
        ("login.failed", "Échec de la connexion."),
        (
            "login.invalid_credentials",
            "Le nom d'utilisateur ou le mot de passe est incorrect. Veuillez réessayer.",
        ),
        (
            "login.account_deactivated",
            "Votre compte a été désactivé. Veuillez contacter votre administrateur.",
        ),
        (
            "login.check_credentials",
            "Veuillez vérifier vos identifiants et réessayer.",
        ),
        (
            "login.check_input",
            "Veuillez vérifier vos informations et réessayer.",
        ),
        (
            "login.server_trouble",
            "Nos serveurs rencontrent des problèmes. Veuillez réessayer dans quelques instants.",
        ),
        ("login.retry", "Veuillez réessayer."),
        (
            "login.network",
            "Erreur réseau. Veuillez vérifier votre connexion et réessayer.",
        ),
        (
            "session.resumed",
            "Bon retour ! Redirection vers votre tableau de bord...",
        ),
        (
            "session.expired",
            "Votre session a expiré. Veuillez vous reconnecter.",
        ),
        (
            "session.unreachable",
            "Impossible de se connecter au serveur. Veuillez vérifier votre connexion Internet et réessayer.",
        ),
        (
            "session.check_failed",
            "Échec de la vérification de la session. Veuillez vous reconnecter.",
        ),
        ("role.name_required", "Le nom du rôle est obligatoire"),
        (
            "role.name_too_short",
            "Le nom du rôle doit contenir au moins 2 caractères",
        ),
        ("role.name_taken", "Un rôle avec ce nom existe déjà"),
        ("role.created", "Rôle créé avec succès"),
        ("role.updated", "Rôle mis à jour avec succès"),
        ("role.deleted", "Rôle supprimé avec succès"),
        ("role.load_failed", "Échec du chargement des rôles"),
        ("role.create_failed", "Échec de la création du rôle"),
        ("role.update_failed", "Échec de la mise à jour du rôle"),
        ("role.delete_failed", "Échec de la suppression du rôle"),
        ("role.empty", "Aucun rôle trouvé"),
        (
            "password.all_required",
            "Tous les champs de mot de passe sont obligatoires",
        ),
        (
            "password.mismatch",
            "Le nouveau mot de passe et sa confirmation ne correspondent pas",
        ),
        (
            "password.too_short",
            "Le mot de passe doit contenir au moins 8 caractères",
        ),
        ("password.changed", "Mot de passe modifié avec succès"),
        (
            "password.change_failed",
            "Échec de la modification du mot de passe",
        ),
        ("form.required", "Ce champ est obligatoire"),
        (
            "form.invalid_email",
            "Veuillez entrer une adresse e-mail valide",
        ),
        (
            "form.invalid_phone",
            "Veuillez entrer un numéro de téléphone valide",
        ),
        ("profile.updated", "Profil mis à jour avec succès !"),
        ("profile.update_failed", "Échec de la mise à jour du profil."),
        ("profile.email_taken", "L'adresse e-mail est déjà utilisée."),
        (
            "profile.unreachable",
            "Impossible de se connecter au serveur. Veuillez vérifier votre connexion.",
        ),
        (
            "profile.login_required",
            "Veuillez vous connecter pour mettre à jour votre profil.",
        ),
        (
            "profile.view_login_required",
            "Veuillez vous connecter pour accéder à votre profil.",
        ),
        (
            "profile.load_unreachable",
            "Impossible de se connecter au serveur. Veuillez vérifier votre connexion et réessayer.",
        ),
        (
            "profile.load_failed",
            "Impossible de charger les informations du profil. Veuillez réessayer.",
        ),
        ("department.placeholder", "Sélectionner un département"),
        ("department.load_failed", "Échec du chargement des départements"),
        ("role.empty_hint", "Cliquez sur \"Nouveau rôle\" pour commencer"),
        ("role.edit", "Modifier"),
        ("role.delete", "Supprimer"),
        ("session.login_required", "Veuillez vous connecter pour continuer."),
        (
            "session.storage_failed",
            "Impossible d'accéder à la session locale.",
        ),
    ])
}

fn en_us_map() -> BTreeMap<&'static str, &'static str> {
    BTreeMap::from([
        ("app.title", "Cabinet Management"),
        ("alert.success", "Success!"),
        ("alert.error", "Error!"),
        ("header.default_name", "User"),
        ("header.default_role", "User"),
        ("header.guest", "Guest"),
        (
            "login.missing_fields",
            "Please enter both username and password to continue.",
        ),
        (
            "login.welcome",
            "Welcome back, {name}! Redirecting to your dashboard...",
        ),
        ("login.failed", "Login failed."),
        (
            "login.invalid_credentials",
            "The username or password is incorrect. Please try again.",
        ),
        (
            "login.account_deactivated",
            "Your account has been deactivated. Please contact your administrator.",
        ),
        (
            "login.check_credentials",
            "Please check your credentials and try again.",
        ),
        (
            "login.check_input",
            "Please check your information and try again.",
        ),
        (
            "login.server_trouble",
            "Our servers are having trouble. Please try again in a moment.",
        ),
        ("login.retry", "Please try again."),
        (
            "login.network",
            "Network error. Please check your connection and try again.",
        ),
        (
            "session.resumed",
            "Welcome back! Redirecting to your dashboard...",
        ),
        (
            "session.expired",
            "Your session has expired. Please log in again.",
        ),
        (
            "session.unreachable",
            "Unable to reach the server. Please check your internet connection and try again.",
        ),
        (
            "session.check_failed",
            "Session check failed. Please log in again.",
        ),
        ("role.name_required", "Role name is required"),
        (
            "role.name_too_short",
            "Role name must be at least 2 characters",
        ),
        ("role.name_taken", "A role with this name already exists"),
        ("role.created", "Role created successfully"),
        ("role.updated", "Role updated successfully"),
        ("role.deleted", "Role deleted successfully"),
        ("role.load_failed", "Failed to load roles"),
        ("role.create_failed", "Failed to create role"),
        ("role.update_failed", "Failed to update role"),
        ("role.delete_failed", "Failed to delete role"),
        ("role.empty", "No roles found"),
        ("password.all_required", "All password fields are required"),
        (
            "password.mismatch",
            "New password and confirm password do not match",
        ),
        (
            "password.too_short",
            "Password must be at least 8 characters long",
        ),
        ("password.changed", "Password changed successfully"),
        ("password.change_failed", "Failed to change password"),
        ("form.required", "This field is required"),
        ("form.invalid_email", "Please enter a valid email address"),
        ("form.invalid_phone", "Please enter a valid phone number"),
        ("profile.updated", "Profile updated successfully!"),
        ("profile.update_failed", "Failed to update profile."),
        ("profile.email_taken", "The email address is already in use."),
        (
            "profile.unreachable",
            "Unable to reach the server. Please check your connection.",
        ),
        (
            "profile.login_required",
            "Please log in to update your profile.",
        ),
        ("profile.view_login_required", "Please log in to view your profile."),
        (
            "profile.load_unreachable",
            "Unable to reach the server. Please check your connection and try again.",
        ),
        (
            "profile.load_failed",
            "Unable to load profile information. Please try again.",
        ),
        ("department.placeholder", "Select a department"),
        ("department.load_failed", "Failed to load departments"),
        ("role.empty_hint", "Click \"New role\" to get started"),
        ("role.edit", "Edit"),
        ("role.delete", "Delete"),
        ("session.login_required", "Please log in to continue."),
        ("session.storage_failed", "Unable to access the local session."),
    ])
}
