// src/db/memory_repo.rs
//
// Repositórios em memória para os testes. Reproduzem as regras que o Postgres
// garante (unicidade, cascade, ordem "mais recentes primeiro").

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::common::pagination::{ListFilter, Paged};
use crate::db::{PermissionRepository, Repositories, RoleRepository, SessionRepository, UserRepository};
use crate::models::auth::{NewUser, Session, User, UserWithRoles};
use crate::models::rbac::{Permission, Role, RoleWithPermissions};

#[derive(Default)]
struct State {
    // Sequência de inserção: desempata registros criados no mesmo instante
    seq: u64,
    permissions: Vec<(u64, Permission)>,
    roles: Vec<(u64, Role)>,
    users: Vec<(u64, User)>,
    role_permissions: BTreeSet<(Uuid, Uuid)>,
    user_roles: BTreeSet<(Uuid, Uuid)>,
    sessions: HashMap<Uuid, Session>,
}

impl State {
    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    fn permission(&self, id: Uuid) -> Option<&Permission> {
        self.permissions.iter().map(|(_, p)| p).find(|p| p.id == id)
    }

    fn role(&self, id: Uuid) -> Option<&Role> {
        self.roles.iter().map(|(_, r)| r).find(|r| r.id == id)
    }

    fn permissions_of(&self, role_id: Uuid) -> Vec<Permission> {
        let mut permissions: Vec<Permission> = self
            .role_permissions
            .iter()
            .filter(|(r, _)| *r == role_id)
            .filter_map(|(_, p)| self.permission(*p).cloned())
            .collect();
        permissions.sort_by(|a, b| a.name.cmp(&b.name));
        permissions
    }

    fn roles_of(&self, user_id: Uuid) -> Vec<Role> {
        let mut roles: Vec<Role> = self
            .user_roles
            .iter()
            .filter(|(u, _)| *u == user_id)
            .filter_map(|(_, r)| self.role(*r).cloned())
            .collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        roles
    }
}

fn newest_first<T: Clone>(rows: &[(u64, T)], keep: impl Fn(&T) -> bool) -> Vec<T> {
    let mut selected: Vec<&(u64, T)> = rows.iter().filter(|(_, row)| keep(row)).collect();
    selected.sort_by(|a, b| b.0.cmp(&a.0));
    selected.into_iter().map(|(_, row)| row.clone()).collect()
}

fn page_of<T>(rows: Vec<T>, filter: &ListFilter) -> Paged<T> {
    let total = rows.len() as i64;
    let items = rows
        .into_iter()
        .skip(filter.offset() as usize)
        .take(filter.limit() as usize)
        .collect();
    Paged { items, total }
}

fn unique_violation(field: &'static str, message: &str) -> AppError {
    AppError::UniqueConstraintViolation {
        field,
        message: message.to_string(),
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn repositories(&self) -> Repositories {
        Repositories {
            permissions: Arc::new(self.clone()),
            roles: Arc::new(self.clone()),
            users: Arc::new(self.clone()),
            sessions: Arc::new(self.clone()),
        }
    }

    /// Marca o e-mail como verificado (o fluxo de verificação fica fora do painel).
    pub async fn verify_email(&self, user_id: Uuid, at: DateTime<Utc>) {
        let mut state = self.state.write().await;
        if let Some((_, user)) = state.users.iter_mut().find(|(_, u)| u.id == user_id) {
            user.email_verified_at = Some(at);
        }
    }
}

#[async_trait]
impl PermissionRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Permission>, AppError> {
        Ok(self.state.read().await.permission(id).cloned())
    }

    async fn search(&self, filter: &ListFilter) -> Result<Paged<Permission>, AppError> {
        let state = self.state.read().await;
        let rows = newest_first(&state.permissions, |p| filter.matches(&p.name));
        Ok(page_of(rows, filter))
    }

    async fn list_ordered_by_name(&self) -> Result<Vec<Permission>, AppError> {
        let state = self.state.read().await;
        let mut permissions: Vec<Permission> = state.permissions.iter().map(|(_, p)| p.clone()).collect();
        permissions.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(permissions)
    }

    async fn find_by_names(&self, names: &[String]) -> Result<Vec<Permission>, AppError> {
        let state = self.state.read().await;
        let mut permissions: Vec<Permission> = state
            .permissions
            .iter()
            .map(|(_, p)| p)
            .filter(|p| names.contains(&p.name))
            .cloned()
            .collect();
        permissions.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(permissions)
    }

    async fn name_taken(&self, name: &str, except: Option<Uuid>) -> Result<bool, AppError> {
        let state = self.state.read().await;
        Ok(state
            .permissions
            .iter()
            .any(|(_, p)| p.name == name && Some(p.id) != except))
    }

    async fn create(&self, name: &str) -> Result<Permission, AppError> {
        let mut state = self.state.write().await;
        if state.permissions.iter().any(|(_, p)| p.name == name) {
            return Err(unique_violation("name", "Já existe uma permissão com esse nome."));
        }
        let now = Utc::now();
        let permission = Permission {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };
        let seq = state.next_seq();
        state.permissions.push((seq, permission.clone()));
        Ok(permission)
    }

    async fn update(&self, id: Uuid, name: &str) -> Result<Option<Permission>, AppError> {
        let mut state = self.state.write().await;
        if state.permissions.iter().any(|(_, p)| p.name == name && p.id != id) {
            return Err(unique_violation("name", "Já existe uma permissão com esse nome."));
        }
        Ok(state
            .permissions
            .iter_mut()
            .map(|(_, p)| p)
            .find(|p| p.id == id)
            .map(|p| {
                p.name = name.to_string();
                p.updated_at = Utc::now();
                p.clone()
            }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        let before = state.permissions.len();
        state.permissions.retain(|(_, p)| p.id != id);
        state.role_permissions.retain(|(_, p)| *p != id);
        Ok(state.permissions.len() < before)
    }
}

#[async_trait]
impl RoleRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Role>, AppError> {
        Ok(self.state.read().await.role(id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, AppError> {
        let state = self.state.read().await;
        Ok(state.roles.iter().map(|(_, r)| r).find(|r| r.name == name).cloned())
    }

    async fn find_by_names(&self, names: &[String]) -> Result<Vec<Role>, AppError> {
        let state = self.state.read().await;
        let mut roles: Vec<Role> = state
            .roles
            .iter()
            .map(|(_, r)| r)
            .filter(|r| names.contains(&r.name))
            .cloned()
            .collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    async fn search(&self, filter: &ListFilter) -> Result<Paged<RoleWithPermissions>, AppError> {
        let state = self.state.read().await;
        let rows = newest_first(&state.roles, |r| filter.matches(&r.name));
        let paged = page_of(rows, filter);
        let items = paged
            .items
            .into_iter()
            .map(|role| RoleWithPermissions {
                permissions: state.permissions_of(role.id),
                role,
            })
            .collect();
        Ok(Paged { items, total: paged.total })
    }

    async fn list_latest(&self, excluding: Option<&str>) -> Result<Vec<Role>, AppError> {
        let state = self.state.read().await;
        Ok(newest_first(&state.roles, |r| Some(r.name.as_str()) != excluding))
    }

    async fn permissions_of(&self, role_id: Uuid) -> Result<Vec<Permission>, AppError> {
        Ok(self.state.read().await.permissions_of(role_id))
    }

    async fn name_taken(&self, name: &str, except: Option<Uuid>) -> Result<bool, AppError> {
        let state = self.state.read().await;
        Ok(state.roles.iter().any(|(_, r)| r.name == name && Some(r.id) != except))
    }

    async fn create(&self, name: &str, permission_ids: &[Uuid]) -> Result<Role, AppError> {
        let mut state = self.state.write().await;
        if state.roles.iter().any(|(_, r)| r.name == name) {
            return Err(unique_violation("name", "Já existe um cargo com esse nome."));
        }
        let now = Utc::now();
        let role = Role {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };
        let seq = state.next_seq();
        state.roles.push((seq, role.clone()));
        for permission_id in permission_ids {
            state.role_permissions.insert((role.id, *permission_id));
        }
        Ok(role)
    }

    async fn update(&self, id: Uuid, name: &str, permission_ids: &[Uuid]) -> Result<Option<Role>, AppError> {
        let mut state = self.state.write().await;
        if state.roles.iter().any(|(_, r)| r.name == name && r.id != id) {
            return Err(unique_violation("name", "Já existe um cargo com esse nome."));
        }
        let Some(role) = state.roles.iter_mut().map(|(_, r)| r).find(|r| r.id == id) else {
            return Ok(None);
        };
        role.name = name.to_string();
        role.updated_at = Utc::now();
        let role = role.clone();

        state.role_permissions.retain(|(r, _)| *r != id);
        for permission_id in permission_ids {
            state.role_permissions.insert((id, *permission_id));
        }
        Ok(Some(role))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        let before = state.roles.len();
        state.roles.retain(|(_, r)| r.id != id);
        state.role_permissions.retain(|(r, _)| *r != id);
        state.user_roles.retain(|(_, r)| *r != id);
        Ok(state.roles.len() < before)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let state = self.state.read().await;
        Ok(state.users.iter().map(|(_, u)| u).find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let state = self.state.read().await;
        Ok(state.users.iter().map(|(_, u)| u).find(|u| u.email == email).cloned())
    }

    async fn search(&self, filter: &ListFilter) -> Result<Paged<UserWithRoles>, AppError> {
        let state = self.state.read().await;
        let rows = newest_first(&state.users, |u| filter.matches(&u.name));
        let paged = page_of(rows, filter);
        let items = paged
            .items
            .into_iter()
            .map(|user| UserWithRoles {
                roles: state.roles_of(user.id),
                user,
            })
            .collect();
        Ok(Paged { items, total: paged.total })
    }

    async fn roles_of(&self, user_id: Uuid) -> Result<Vec<Role>, AppError> {
        Ok(self.state.read().await.roles_of(user_id))
    }

    async fn email_taken(&self, email: &str, except: Option<Uuid>) -> Result<bool, AppError> {
        let state = self.state.read().await;
        Ok(state.users.iter().any(|(_, u)| u.email == email && Some(u.id) != except))
    }

    async fn create(&self, new_user: &NewUser, role_ids: &[Uuid]) -> Result<User, AppError> {
        let mut state = self.state.write().await;
        if state.users.iter().any(|(_, u)| u.email == new_user.email) {
            return Err(unique_violation("email", "Este e-mail já está em uso."));
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name.clone(),
            email: new_user.email.clone(),
            password_hash: new_user.password_hash.clone(),
            email_verified_at: None,
            created_at: now,
            updated_at: now,
        };
        let seq = state.next_seq();
        state.users.push((seq, user.clone()));
        for role_id in role_ids {
            state.user_roles.insert((user.id, *role_id));
        }
        Ok(user)
    }

    async fn update(&self, id: Uuid, name: &str, email: &str, role_ids: &[Uuid]) -> Result<Option<User>, AppError> {
        let updated = self.update_profile(id, name, email).await?;
        if updated.is_some() {
            let mut state = self.state.write().await;
            state.user_roles.retain(|(u, _)| *u != id);
            for role_id in role_ids {
                state.user_roles.insert((id, *role_id));
            }
        }
        Ok(updated)
    }

    async fn update_profile(&self, id: Uuid, name: &str, email: &str) -> Result<Option<User>, AppError> {
        let mut state = self.state.write().await;
        if state.users.iter().any(|(_, u)| u.email == email && u.id != id) {
            return Err(unique_violation("email", "Este e-mail já está em uso."));
        }
        Ok(state
            .users
            .iter_mut()
            .map(|(_, u)| u)
            .find(|u| u.id == id)
            .map(|user| {
                if user.email != email {
                    user.email_verified_at = None;
                }
                user.name = name.to_string();
                user.email = email.to_string();
                user.updated_at = Utc::now();
                user.clone()
            }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        let before = state.users.len();
        state.users.retain(|(_, u)| u.id != id);
        state.user_roles.retain(|(u, _)| *u != id);
        state.sessions.retain(|_, s| s.user_id != id);
        Ok(state.users.len() < before)
    }

    async fn effective_permissions(&self, user_id: Uuid) -> Result<Vec<String>, AppError> {
        let state = self.state.read().await;
        let names: BTreeSet<String> = state
            .roles_of(user_id)
            .iter()
            .flat_map(|role| state.permissions_of(role.id))
            .map(|p| p.name)
            .collect();
        Ok(names.into_iter().collect())
    }
}

#[async_trait]
impl SessionRepository for MemoryStore {
    async fn create(&self, user_id: Uuid, expires_at: DateTime<Utc>) -> Result<Session, AppError> {
        let session = Session {
            id: Uuid::new_v4(),
            user_id,
            flash: None,
            created_at: Utc::now(),
            expires_at,
        };
        self.state.write().await.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Session>, AppError> {
        Ok(self.state.read().await.sessions.get(&id).cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.state.write().await.sessions.remove(&id).is_some())
    }

    async fn set_flash(&self, id: Uuid, message: &str) -> Result<(), AppError> {
        if let Some(session) = self.state.write().await.sessions.get_mut(&id) {
            session.flash = Some(message.to_string());
        }
        Ok(())
    }

    async fn take_flash(&self, id: Uuid) -> Result<Option<String>, AppError> {
        Ok(self
            .state
            .write()
            .await
            .sessions
            .get_mut(&id)
            .and_then(|session| session.flash.take()))
    }
}
