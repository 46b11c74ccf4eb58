//! Query parameter extractors for list and search endpoints.
//!
//! Page fields are repeated per struct rather than flattened, since
//! `serde_urlencoded` cannot parse numbers through `#[serde(flatten)]`.

use serde::Deserialize;

use labinv_types::chemical::ChemicalFilter;
use labinv_types::page::{DEFAULT_PAGE_SIZE, PageRequest};
use labinv_types::study::StudyFilter;

/// Default page size of the study code search.
pub const STUDY_SEARCH_PAGE_SIZE: u32 = 10;

/// `?page=&size=`
#[derive(Debug, Deserialize, Default)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl PageQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.size, DEFAULT_PAGE_SIZE)
    }
}

/// `GET /api/chemicals/search?name=`
#[derive(Debug, Deserialize)]
pub struct NameQuery {
    pub name: String,
}

/// `GET /api/chemicals/search-cas?casNo=`
#[derive(Debug, Deserialize)]
pub struct CasQuery {
    #[serde(rename = "casNo", alias = "cas_no", alias = "cas")]
    pub cas_no: String,
}

/// `GET /api/chemicals/filter`
#[derive(Debug, Deserialize, Default)]
pub struct ChemicalFilterQuery {
    pub name: Option<String>,
    pub storage: Option<String>,
    pub responsible: Option<String>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl ChemicalFilterQuery {
    pub fn into_parts(self) -> (ChemicalFilter, PageRequest) {
        let page = PageRequest::new(self.page, self.size, DEFAULT_PAGE_SIZE);
        let filter = ChemicalFilter {
            name: self.name,
            storage: self.storage,
            responsible: self.responsible,
            toxic_only: false,
        };
        (filter, page)
    }
}

/// `GET /api/studies?status=&riskLevel=&responsiblePerson=`
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StudyListQuery {
    pub status: Option<String>,
    #[serde(alias = "risk_level")]
    pub risk_level: Option<String>,
    #[serde(alias = "responsible_person")]
    pub responsible_person: Option<String>,
}

impl From<StudyListQuery> for StudyFilter {
    fn from(q: StudyListQuery) -> Self {
        StudyFilter {
            status: q.status,
            risk_level: q.risk_level,
            responsible_person: q.responsible_person,
            study_code: None,
        }
    }
}

/// `GET /api/studies/search?filter=&page=&size=`
#[derive(Debug, Deserialize, Default)]
pub struct StudySearchQuery {
    #[serde(alias = "studyCode")]
    pub filter: Option<String>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl StudySearchQuery {
    pub fn into_parts(self) -> (Option<String>, PageRequest) {
        (
            self.filter,
            PageRequest::new(self.page, self.size, STUDY_SEARCH_PAGE_SIZE),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::extract::Query;
    use axum::http::Uri;

    fn parse<T: serde::de::DeserializeOwned>(qs: &str) -> T {
        let uri: Uri = format!("/api?{qs}").parse().unwrap();
        Query::<T>::try_from_uri(&uri).unwrap().0
    }

    #[test]
    fn test_chemical_filter_query() {
        let q: ChemicalFilterQuery = parse("storage=Cab&page=2&size=5");
        let (filter, page) = q.into_parts();
        assert_eq!(filter.storage.as_deref(), Some("Cab"));
        assert_eq!(page, PageRequest { page: 2, size: 5 });
    }

    #[test]
    fn test_study_search_defaults_to_ten() {
        let q: StudySearchQuery = parse("filter=RA");
        let (term, page) = q.into_parts();
        assert_eq!(term.as_deref(), Some("RA"));
        assert_eq!(page.size, STUDY_SEARCH_PAGE_SIZE);
        assert_eq!(page.page, 1);
    }

    #[test]
    fn test_study_list_query_accepts_camel_case() {
        let q: StudyListQuery = parse("riskLevel=High&responsiblePerson=Ann");
        let filter = StudyFilter::from(q);
        assert_eq!(filter.risk_level.as_deref(), Some("High"));
        assert_eq!(filter.responsible_person.as_deref(), Some("Ann"));
    }

    #[test]
    fn test_cas_query() {
        let q: CasQuery = parse("casNo=64-17-5");
        assert_eq!(q.cas_no, "64-17-5");
    }
}
