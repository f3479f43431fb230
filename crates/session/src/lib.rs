use std::fs;
use std::path::{Path, PathBuf};

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use anyhow::{Context, Result, anyhow, bail};
use argon2::Argon2;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use core_types::{CurrentUser, DepartmentId, LoginResponse};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

const SCHEMA_VERSION: u32 = 1;
const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session is encrypted but no password was provided")]
    MissingPassword,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_department_id: Option<DepartmentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_specialization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_doctor_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_is_doctor: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    root: PathBuf,
    encryption_password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PlainSessionFile {
    schema_version: u32,
    session: SessionSnapshot,
}

#[derive(Debug, Serialize, Deserialize)]
struct EncryptedSessionFile {
    schema_version: u32,
    salt_b64: String,
    nonce_b64: String,
    ciphertext_b64: String,
}

impl SessionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            encryption_password: None,
        }
    }

    pub fn set_password(&mut self, password: Option<String>) {
        self.encryption_password = password;
    }

    pub fn is_encrypted_mode(&self) -> bool {
        self.encryption_password.is_some()
    }

    pub fn snapshot(&self) -> Result<SessionSnapshot> {
        match (
            self.plain_path().exists(),
            self.encrypted_path().exists(),
            self.encryption_password.as_deref(),
        ) {
            (false, false, _) => Ok(SessionSnapshot::default()),
            (_, true, Some(password)) => self.read_encrypted_file(password),
            (false, true, None) => Err(SessionError::MissingPassword.into()),
            (true, _, _) => self.read_plain_file(),
        }
    }

    pub fn access_token(&self) -> Result<Option<String>> {
        Ok(self.snapshot()?.access_token)
    }

    pub fn set_access_token(&self, token: impl Into<String>) -> Result<()> {
        let token = token.into();
        self.update(|session| session.access_token = Some(token))
    }

    pub fn clear_access_token(&self) -> Result<()> {
        self.update(|session| session.access_token = None)
    }

    pub fn remember_login(&self, login: &LoginResponse) -> Result<()> {
        self.update(|session| {
            session.access_token = Some(login.access_token.clone());
            if let Some(user) = &login.user {
                session.user_name = Some(format!(
                    "{} {}",
                    user.first_name.as_deref().unwrap_or_default(),
                    user.last_name.as_deref().unwrap_or_default()
                ));
                session.user_role = user.role.clone();
            }
        })
    }

    pub fn remember_profile(&self, user: &CurrentUser) -> Result<()> {
        self.update(|session| {
            if let Some(name) = user.display_name() {
                session.user_name = Some(name);
            }
            if let Some(department_id) = user.department_id {
                session.user_department_id = Some(department_id);
            }
            if let Some(specialization) = user.specialization.as_ref().filter(|s| !s.is_empty()) {
                session.user_specialization = Some(specialization.clone());
            }
            if let Some(code) = user.doctor_code.as_ref().filter(|c| !c.is_empty()) {
                session.user_doctor_code = Some(code.clone());
            }
            session.user_is_doctor = Some(user.is_doctor);
        })
    }

    fn update(&self, apply: impl FnOnce(&mut SessionSnapshot)) -> Result<()> {
        let mut session = self.snapshot()?;
        apply(&mut session);
        self.save(&session)
    }

    fn save(&self, session: &SessionSnapshot) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("failed to create {}", self.root.display()))?;

        if let Some(password) = self.encryption_password.as_deref() {
            let encrypted = encrypt_session(password, session)?;
            fs::write(
                self.encrypted_path(),
                serde_json::to_string_pretty(&encrypted)?,
            )?;
            remove_if_exists(&self.plain_path());
            info!("session persisted in encrypted mode");
            return Ok(());
        }

        let plain = PlainSessionFile {
            schema_version: SCHEMA_VERSION,
            session: session.clone(),
        };
        fs::write(self.plain_path(), serde_json::to_string_pretty(&plain)?)?;
        remove_if_exists(&self.encrypted_path());
        info!("session persisted in plain mode");
        Ok(())
    }

    fn read_plain_file(&self) -> Result<SessionSnapshot> {
        let text = fs::read_to_string(self.plain_path())?;
        let doc: PlainSessionFile =
            serde_json::from_str(&text).context("failed to parse session file")?;
        Ok(doc.session)
    }

    fn read_encrypted_file(&self, password: &str) -> Result<SessionSnapshot> {
        let text = fs::read_to_string(self.encrypted_path())?;
        let doc: EncryptedSessionFile =
            serde_json::from_str(&text).context("failed to parse encrypted session file")?;
        decrypt_session(password, &doc)
    }

    fn plain_path(&self) -> PathBuf {
        self.root.join("session.json")
    }

    fn encrypted_path(&self) -> PathBuf {
        self.root.join("session.enc.json")
    }
}

fn remove_if_exists(path: &Path) {
    if path.exists() {
        fs::remove_file(path).ok();
    }
}

fn derive_key(password: &str, salt: &[u8]) -> Result<[u8; 32]> {
    let mut key = [0u8; 32];
    Argon2::default()
        .hash_password_into(password.as_bytes(), salt, &mut key)
        .map_err(|e| anyhow!("failed to derive session key: {e}"))?;
    Ok(key)
}

fn encrypt_session(password: &str, session: &SessionSnapshot) -> Result<EncryptedSessionFile> {
    let plaintext = serde_json::to_vec(session)?;
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);

    let key = derive_key(password, &salt)?;
    let cipher = Aes256Gcm::new_from_slice(&key).context("failed to build cipher")?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_ref())
        .map_err(|e| anyhow!("failed to encrypt session: {e}"))?;

    Ok(EncryptedSessionFile {
        schema_version: SCHEMA_VERSION,
        salt_b64: BASE64.encode(salt),
        nonce_b64: BASE64.encode(nonce_bytes),
        ciphertext_b64: BASE64.encode(ciphertext),
    })
}

fn decrypt_session(password: &str, encrypted: &EncryptedSessionFile) -> Result<SessionSnapshot> {
    let salt = BASE64.decode(&encrypted.salt_b64)?;
    let nonce_bytes = BASE64.decode(&encrypted.nonce_b64)?;
    let ciphertext = BASE64.decode(&encrypted.ciphertext_b64)?;
    if nonce_bytes.len() != NONCE_LEN {
        bail!("invalid nonce length");
    }

    let key = derive_key(password, &salt)?;
    let cipher = Aes256Gcm::new_from_slice(&key).context("failed to build cipher")?;
    let plaintext = cipher
        .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_ref())
        .map_err(|e| anyhow!("failed to decrypt session: {e}"))?;
    Ok(serde_json::from_slice(&plaintext)?)
}

pub fn default_session_dir_from(base_dir: &Path) -> PathBuf {
    base_dir.join("session")
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn login() -> LoginResponse {
        LoginResponse {
            access_token: "tok-1".into(),
            token_type: Some("bearer".into()),
            user: Some(CurrentUser {
                first_name: Some("Sara".into()),
                last_name: Some("Alaoui".into()),
                role: Some("Doctor".into()),
                ..CurrentUser::default()
            }),
        }
    }

    #[test]
    fn empty_store_has_no_token() {
        let dir = tempdir().expect("tempdir");
        let store = SessionStore::new(dir.path());
        assert_eq!(store.access_token().expect("read"), None);
    }

    #[test]
    fn login_is_remembered_across_instances() {
        let dir = tempdir().expect("tempdir");
        SessionStore::new(dir.path())
            .remember_login(&login())
            .expect("write");

        let snapshot = SessionStore::new(dir.path()).snapshot().expect("read");
        assert_eq!(snapshot.access_token.as_deref(), Some("tok-1"));
        assert_eq!(snapshot.user_name.as_deref(), Some("Sara Alaoui"));
        assert_eq!(snapshot.user_role.as_deref(), Some("Doctor"));
    }

    #[test]
    fn clearing_token_keeps_user_fields() {
        let dir = tempdir().expect("tempdir");
        let store = SessionStore::new(dir.path());
        store.remember_login(&login()).expect("write");
        store.clear_access_token().expect("clear");
        let snapshot = store.snapshot().expect("read");
        assert_eq!(snapshot.access_token, None);
        assert_eq!(snapshot.user_name.as_deref(), Some("Sara Alaoui"));
    }

    #[test]
    fn profile_update_only_overwrites_present_fields() {
        let dir = tempdir().expect("tempdir");
        let store = SessionStore::new(dir.path());
        store.remember_login(&login()).expect("write");
        store
            .remember_profile(&CurrentUser {
                first_name: Some("Sara".into()),
                last_name: Some("Bennani".into()),
                department_id: Some(4),
                specialization: Some(String::new()),
                doctor_code: Some("DR-7".into()),
                is_doctor: true,
                ..CurrentUser::default()
            })
            .expect("profile");

        let snapshot = store.snapshot().expect("read");
        assert_eq!(snapshot.user_name.as_deref(), Some("Sara Bennani"));
        assert_eq!(snapshot.user_department_id, Some(4));
        assert_eq!(snapshot.user_specialization, None);
        assert_eq!(snapshot.user_doctor_code.as_deref(), Some("DR-7"));
        assert_eq!(snapshot.user_is_doctor, Some(true));
        assert_eq!(snapshot.access_token.as_deref(), Some("tok-1"));
    }

    #[test]
    fn encrypted_session_needs_password() {
        let dir = tempdir().expect("tempdir");
        let mut store = SessionStore::new(dir.path());
        store.set_password(Some("p@ss".into()));
        store.set_access_token("tok-2").expect("write");
        assert!(!dir.path().join("session.json").exists());

        let mut reopened = SessionStore::new(dir.path());
        let err = reopened.access_token().expect_err("no password");
        assert!(err.downcast_ref::<SessionError>().is_some(), "{err}");

        reopened.set_password(Some("p@ss".into()));
        assert_eq!(reopened.access_token().expect("read").as_deref(), Some("tok-2"));

        reopened.set_password(Some("wrong".into()));
        let err = reopened.access_token().expect_err("bad password");
        assert!(err.to_string().contains("failed to decrypt"), "{err}");
    }
}
