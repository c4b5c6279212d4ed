//! Tantivy keyword index with one analyzed field per language
use crate::retrieval::Language;
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, Occur, Query, TermQuery};
use tantivy::schema::*;
use tantivy::tokenizer::{
    LowerCaser, RemoveLongFilter, SimpleTokenizer, Stemmer, StopWordFilter, TextAnalyzer,
    TokenStream,
};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyError};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeywordIndexError {
    #[error("Index initialization failed: {0}")]
    InitializationError(String),

    #[error("Insert failed: {0}")]
    InsertError(String),

    #[error("Search failed: {0}")]
    SearchError(String),

    #[error("Analyzer not registered: {0}")]
    MissingAnalyzer(String),

    #[error("Tantivy error: {0}")]
    TantivyError(#[from] TantivyError),
}

/// How analyzed query terms are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermMode {
    /// Every term must match
    All,
    /// Any term may match
    Any,
}

impl TermMode {
    fn occur(&self) -> Occur {
        match self {
            TermMode::All => Occur::Must,
            TermMode::Any => Occur::Should,
        }
    }

    /// Render terms the way a text-search query prints: `'a' & 'b'`
    pub fn render(&self, terms: &[String]) -> String {
        let separator = match self {
            TermMode::All => " & ",
            TermMode::Any => " | ",
        };
        terms
            .iter()
            .map(|t| format!("'{}'", t))
            .collect::<Vec<_>>()
            .join(separator)
    }
}

fn analyzer_name(lang: Language) -> String {
    format!("hybridrank_{}", lang.code())
}

fn build_analyzer(lang: Language) -> Result<TextAnalyzer, KeywordIndexError> {
    let stop_words = StopWordFilter::new(lang.analyzer_language()).ok_or_else(|| {
        KeywordIndexError::InitializationError(format!("No stop word list for '{}'", lang))
    })?;

    Ok(TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(RemoveLongFilter::limit(40))
        .filter(LowerCaser)
        .filter(stop_words)
        .filter(Stemmer::new(lang.analyzer_language()))
        .build())
}

/// In-memory BM25 index over document content.
///
/// Every document is indexed once per supported language so the lexical
/// ranker can query whichever variant the language resolver picks.
pub struct KeywordIndex {
    index: Index,
    reader: IndexReader,
    writer: Mutex<IndexWriter>,
    key_field: Field,
    english_field: Field,
    spanish_field: Field,
}

impl KeywordIndex {
    /// Create an empty RAM index
    ///
    /// # Arguments
    /// * `writer_memory_bytes` - Heap budget for the single indexing thread
    pub fn new(writer_memory_bytes: usize) -> Result<Self, KeywordIndexError> {
        let mut schema_builder = Schema::builder();

        let key_field = schema_builder.add_u64_field("key", INDEXED | STORED);
        let english_field = schema_builder.add_text_field("text_en", text_options(Language::English));
        let spanish_field = schema_builder.add_text_field("text_es", text_options(Language::Spanish));

        let schema = schema_builder.build();
        let index = Index::create_in_ram(schema);

        for lang in Language::ALL {
            index
                .tokenizers()
                .register(&analyzer_name(lang), build_analyzer(lang)?);
        }

        let writer = index
            .writer_with_num_threads(1, writer_memory_bytes)
            .map_err(|e| KeywordIndexError::InitializationError(e.to_string()))?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e| KeywordIndexError::InitializationError(e.to_string()))?;

        Ok(Self {
            index,
            reader,
            writer: Mutex::new(writer),
            key_field,
            english_field,
            spanish_field,
        })
    }

    fn field(&self, lang: Language) -> Field {
        match lang {
            Language::English => self.english_field,
            Language::Spanish => self.spanish_field,
        }
    }

    fn writer_mut(&mut self) -> Result<&mut IndexWriter, KeywordIndexError> {
        self.writer
            .get_mut()
            .map_err(|_| KeywordIndexError::InsertError("index writer lock poisoned".to_string()))
    }

    /// Insert a document's content under its store key
    pub fn insert(&mut self, key: u64, text: &str) -> Result<(), KeywordIndexError> {
        let doc = doc!(
            self.key_field => key,
            self.english_field => text,
            self.spanish_field => text,
        );

        self.writer_mut()?
            .add_document(doc)
            .map_err(|e| KeywordIndexError::InsertError(e.to_string()))?;

        Ok(())
    }

    /// Commit pending documents and make them searchable
    pub fn commit(&mut self) -> Result<(), KeywordIndexError> {
        self.writer_mut()?
            .commit()
            .map_err(|e| KeywordIndexError::InsertError(e.to_string()))?;

        self.reader
            .reload()
            .map_err(|e| KeywordIndexError::SearchError(e.to_string()))?;

        Ok(())
    }

    /// Run text through a language's analyzer.
    ///
    /// Returns the distinct stemmed terms in first-seen order; stop words
    /// and over-long tokens are dropped.
    pub fn analyze(&self, lang: Language, text: &str) -> Result<Vec<String>, KeywordIndexError> {
        let name = analyzer_name(lang);
        let mut analyzer = self
            .index
            .tokenizers()
            .get(&name)
            .ok_or(KeywordIndexError::MissingAnalyzer(name))?;

        let mut stream = analyzer.token_stream(text);
        let mut terms: Vec<String> = Vec::new();
        while stream.advance() {
            let term = &stream.token().text;
            if !terms.contains(term) {
                terms.push(term.clone());
            }
        }

        Ok(terms)
    }

    /// Score every document matching the analyzed terms
    ///
    /// # Returns
    /// (key, BM25 score) for each matching document, unordered
    pub fn search_terms(
        &self,
        lang: Language,
        terms: &[String],
        mode: TermMode,
    ) -> Result<Vec<(u64, f32)>, KeywordIndexError> {
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let searcher = self.reader.searcher();
        let num_docs = searcher.num_docs() as usize;
        if num_docs == 0 {
            return Ok(Vec::new());
        }

        let field = self.field(lang);
        let clauses: Vec<(Occur, Box<dyn Query>)> = terms
            .iter()
            .map(|text| {
                let term = Term::from_field_text(field, text);
                let query: Box<dyn Query> =
                    Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs));
                (mode.occur(), query)
            })
            .collect();
        let query = BooleanQuery::new(clauses);

        let top_docs = searcher
            .search(&query, &TopDocs::with_limit(num_docs))
            .map_err(|e| KeywordIndexError::SearchError(e.to_string()))?;

        let mut results = Vec::with_capacity(top_docs.len());
        for (score, doc_address) in top_docs {
            let retrieved_doc: tantivy::TantivyDocument = searcher
                .doc(doc_address)
                .map_err(|e| KeywordIndexError::SearchError(e.to_string()))?;

            let key = retrieved_doc
                .get_first(self.key_field)
                .and_then(|v| v.as_u64())
                .ok_or_else(|| {
                    KeywordIndexError::SearchError("Missing or invalid key field".to_string())
                })?;

            results.push((key, score));
        }

        Ok(results)
    }

    /// Get the number of searchable documents
    pub fn len(&self) -> u64 {
        self.reader.searcher().num_docs()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn text_options(lang: Language) -> TextOptions {
    let indexing = TextFieldIndexing::default()
        .set_tokenizer(&analyzer_name(lang))
        .set_index_option(IndexRecordOption::WithFreqsAndPositions);
    TextOptions::default().set_indexing_options(indexing)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_with(docs: &[(u64, &str)]) -> KeywordIndex {
        let mut index = KeywordIndex::new(50_000_000).unwrap();
        for (key, text) in docs {
            index.insert(*key, text).unwrap();
        }
        index.commit().unwrap();
        index
    }

    #[test]
    fn test_index_creation() {
        let index = KeywordIndex::new(50_000_000).unwrap();
        assert_eq!(index.len(), 0);
        assert!(index.is_empty());
    }

    #[test]
    fn test_english_stemming_and_stop_words() {
        let index = KeywordIndex::new(50_000_000).unwrap();
        let terms = index
            .analyze(Language::English, "The royalties of the songs")
            .unwrap();
        assert_eq!(terms, vec!["royalti".to_string(), "song".to_string()]);
    }

    #[test]
    fn test_spanish_analyzer() {
        let index = KeywordIndex::new(50_000_000).unwrap();
        let terms = index
            .analyze(Language::Spanish, "las canciones y los contratos")
            .unwrap();
        assert_eq!(terms.len(), 2);
        assert!(!terms.contains(&"las".to_string()));
    }

    #[test]
    fn test_insert_and_search() {
        let index = index_with(&[
            (1, "The quick brown fox jumps over the lazy dog"),
            (2, "A fast red fox leaps above a sleepy canine"),
            (3, "Python programming language tutorial"),
        ]);
        assert_eq!(index.len(), 3);

        let terms = index.analyze(Language::English, "foxes").unwrap();
        let results = index.search_terms(Language::English, &terms, TermMode::All).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|(_, score)| *score > 0.0));

        let terms = index.analyze(Language::English, "python").unwrap();
        let results = index.search_terms(Language::English, &terms, TermMode::All).unwrap();
        assert_eq!(results, vec![(3, results[0].1)]);
    }

    #[test]
    fn test_conjunctive_vs_disjunctive() {
        let index = index_with(&[(1, "brown fox"), (2, "brown bear"), (3, "grey wolf")]);
        let terms = index.analyze(Language::English, "brown fox").unwrap();

        let all = index.search_terms(Language::English, &terms, TermMode::All).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].0, 1);

        let any = index.search_terms(Language::English, &terms, TermMode::Any).unwrap();
        assert_eq!(any.len(), 2);
    }

    #[test]
    fn test_render_query() {
        let terms = vec!["royalti".to_string(), "song".to_string()];
        assert_eq!(TermMode::All.render(&terms), "'royalti' & 'song'");
        assert_eq!(TermMode::Any.render(&terms), "'royalti' | 'song'");
        assert_eq!(TermMode::All.render(&[]), "");
    }
}
