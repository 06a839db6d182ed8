//! The bundled demo price list, loaded and searched end to end

use std::path::PathBuf;
use std::sync::Arc;

use price_agent::price_matcher::{CatalogIndex, CatalogMatcher, MorphAnalyzer};
use price_agent::{load_price_list, render_answer};

fn demo_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data/price_list.csv")
}

fn demo_index() -> CatalogIndex {
    let entries = load_price_list(demo_path()).unwrap();
    let matcher = CatalogMatcher::new(Arc::new(MorphAnalyzer::bundled().unwrap()));
    CatalogIndex::new(entries, Arc::new(matcher))
}

#[test]
fn test_demo_categories_carry_forward() {
    let entries = load_price_list(demo_path()).unwrap();
    let category_of = |name: &str| {
        entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.category.clone())
            .unwrap()
    };
    assert_eq!(category_of("Диагностика ходовой части"), "Диагностика");
    assert_eq!(category_of("Замена свечей зажигания"), "Ремонт двигателя");
    assert_eq!(category_of("Ремонт тормозной системы"), "Тормозная система");
    assert_eq!(category_of("Диагностика кондиционера"), "Кондиционер");
}

#[test]
fn test_demo_search() {
    let index = demo_index();
    let names = |query: &str| -> Vec<String> {
        index
            .search(Some(query))
            .into_iter()
            .map(|e| e.name.clone())
            .collect()
    };

    // "Замена масла" covers two of {масляный, масло, фильтр}
    assert_eq!(
        names("масляный фильтр"),
        vec![
            "Замена масла".to_string(),
            "Замена масляного фильтра".to_string()
        ]
    );
    assert_eq!(
        names("тормоза"),
        vec![
            "Замена тормозных колодок".to_string(),
            "Ремонт тормозной системы".to_string()
        ]
    );
    assert_eq!(
        names("кондиционер"),
        vec![
            "Заправка кондиционера".to_string(),
            "Диагностика кондиционера".to_string()
        ]
    );
    assert!(names("цена").is_empty());
}

#[test]
fn test_demo_answer_text() {
    let index = demo_index();
    let found = index.search(Some("ходовая часть"));
    assert_eq!(
        render_answer(found),
        "Доступные услуги:\n\n• Диагностика ходовой части — Цена не указана"
    );
}
