// src/common/pagination.rs

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Todas as listagens do painel usam páginas de 6 itens.
pub const PER_PAGE: u32 = 6;

/// Query string aceita pelas rotas de listagem (`?search=...&page=...`).
#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Trecho do nome (sem diferenciar maiúsculas).
    pub search: Option<String>,
    /// Página a partir de 1.
    pub page: Option<u32>,
}

/// O filtro já normalizado, pronto para o repositório.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFilter {
    pub search: Option<String>,
    pub page: u32,
    pub per_page: u32,
}

impl ListFilter {
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    /// Padrão para `ILIKE`, com os curingas do usuário escapados.
    pub fn like_pattern(&self) -> Option<String> {
        self.search.as_deref().map(|s| {
            let escaped = s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
            format!("%{}%", escaped)
        })
    }

    /// Mesmo critério do `ILIKE`, para quem filtra fora do banco.
    pub fn matches(&self, name: &str) -> bool {
        match &self.search {
            Some(term) => name.to_lowercase().contains(&term.to_lowercase()),
            None => true,
        }
    }
}

impl From<&ListQuery> for ListFilter {
    fn from(query: &ListQuery) -> Self {
        // Busca vazia é o mesmo que nenhuma busca.
        let search = query
            .search
            .as_ref()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Self {
            search,
            page: query.page.unwrap_or(1).max(1),
            per_page: PER_PAGE,
        }
    }
}

/// Resultado bruto do repositório: a fatia pedida e o total sem paginação.
#[derive(Debug)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    pub current_page: u32,
    pub last_page: u32,
    pub per_page: u32,
    pub total: i64,
    /// Posição (1-based) do primeiro item da página, se houver itens.
    pub from: Option<i64>,
    pub to: Option<i64>,
}

impl<T> Page<T> {
    pub fn new(paged: Paged<T>, filter: &ListFilter) -> Self {
        let per_page = i64::from(filter.per_page);
        let last_page = ((paged.total + per_page - 1) / per_page).max(1) as u32;
        let (from, to) = if paged.items.is_empty() {
            (None, None)
        } else {
            let from = filter.offset() + 1;
            (Some(from), Some(from + paged.items.len() as i64 - 1))
        };

        Self {
            data: paged.items,
            current_page: filter.page,
            last_page,
            per_page: filter.per_page,
            total: paged.total,
            from,
            to,
        }
    }
}

/// Devolvido junto com cada listagem para o front manter a busca entre páginas.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Filters {
    pub search: Option<String>,
}

impl From<&ListFilter> for Filters {
    fn from(filter: &ListFilter) -> Self {
        Self { search: filter.search.clone() }
    }
}
