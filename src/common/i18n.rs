// src/common/i18n.rs

use std::{collections::HashMap, sync::Arc};

use anyhow::Context;

pub const DEFAULT_LANG: &str = "en";

// Catálogos embutidos no binário (chave plana -> mensagem)
const CATALOGS: &[(&str, &str)] = &[
    ("en", include_str!("../../locales/en.json")),
    ("pt", include_str!("../../locales/pt.json")),
];

/// Armazena as traduções carregadas na inicialização.
/// Clonar é barato: os catálogos ficam atrás de um `Arc`.
#[derive(Clone, Debug)]
pub struct I18nStore {
    catalogs: Arc<HashMap<String, HashMap<String, String>>>,
}

impl I18nStore {
    pub fn load() -> anyhow::Result<Self> {
        let mut catalogs = HashMap::new();
        for (lang, raw) in CATALOGS {
            let catalog: HashMap<String, String> = serde_json::from_str(raw)
                .with_context(|| format!("Catálogo de idioma '{}' inválido", lang))?;
            catalogs.insert((*lang).to_string(), catalog);
        }
        Ok(Self {
            catalogs: Arc::new(catalogs),
        })
    }

    pub fn supports(&self, lang: &str) -> bool {
        self.catalogs.contains_key(lang)
    }

    /// Busca a mensagem no idioma pedido, depois no idioma padrão.
    /// Se a chave não existir em nenhum catálogo, devolve a própria chave.
    pub fn translate(&self, lang: &str, key: &str) -> String {
        self.lookup(lang, key)
            .or_else(|| self.lookup(DEFAULT_LANG, key))
            .unwrap_or(key)
            .to_string()
    }

    /// Igual ao `translate`, substituindo os marcadores `{nome}` pelos parâmetros.
    pub fn translate_with(&self, lang: &str, key: &str, params: &[(&str, &str)]) -> String {
        let mut message = self.translate(lang, key);
        for (name, value) in params {
            message = message.replace(&format!("{{{}}}", name), value);
        }
        message
    }

    fn lookup(&self, lang: &str, key: &str) -> Option<&str> {
        self.catalogs
            .get(lang)
            .and_then(|catalog| catalog.get(key))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogs_load_and_share_the_same_keys() {
        let store = I18nStore::load().unwrap();
        let en = store.catalogs.get("en").unwrap();
        let pt = store.catalogs.get("pt").unwrap();
        let mut missing: Vec<_> = en.keys().filter(|k| !pt.contains_key(*k)).collect();
        missing.extend(pt.keys().filter(|k| !en.contains_key(*k)));
        assert!(missing.is_empty(), "chaves sem tradução: {:?}", missing);
    }

    #[test]
    fn translate_falls_back_to_default_language() {
        let store = I18nStore::load().unwrap();
        assert_eq!(
            store.translate("de", "errors.lead_not_found"),
            store.translate("en", "errors.lead_not_found")
        );
        assert_eq!(store.translate("pt", "errors.lead_not_found"), "Lead não encontrado.");
    }

    #[test]
    fn unknown_key_is_returned_verbatim() {
        let store = I18nStore::load().unwrap();
        assert_eq!(store.translate("en", "errors.nope"), "errors.nope");
    }

    #[test]
    fn translate_with_fills_placeholders() {
        let store = I18nStore::load().unwrap();
        let msg = store.translate_with("en", "errors.forbidden", &[("permission", "leads:delete")]);
        assert_eq!(msg, "You need the 'leads:delete' permission to perform this action.");
    }
}
