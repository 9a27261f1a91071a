use crate::crm::NoteCategory;
use crate::util::fold;

// Fixed priority order: the first category with any keyword present in the
// note text wins. Matching is accent-insensitive substring containment.
static CATEGORY_KEYWORDS: &[(NoteCategory, &[&str])] = &[
    (
        NoteCategory::Money,
        &["valor", "preco", "pagamento", "entrada", "desconto", "dinheiro", "r$"],
    ),
    (
        NoteCategory::Financing,
        &["financiamento", "financiar", "banco", "credito", "aprovado", "aprovacao"],
    ),
    (
        NoteCategory::Urgency,
        &["urgente", "urgencia", "imediato", "rapido", "hoje"],
    ),
    (
        NoteCategory::Communication,
        &["ligar", "ligacao", "telefone", "whatsapp", "retornar", "contato"],
    ),
    (
        NoteCategory::Sentiment,
        &["gostou", "adorou", "animado", "empolgado", "satisfeito"],
    ),
    (
        NoteCategory::Property,
        &["apartamento", "casa", "imovel", "terreno", "visita", "planta"],
    ),
];

/// Pick the category whose keyword set first matches the note text.
pub fn classify_note(text: &str) -> NoteCategory {
    let folded = fold(text);
    for (category, keywords) in CATEGORY_KEYWORDS {
        if keywords.iter().any(|k| folded.contains(k)) {
            return *category;
        }
    }
    NoteCategory::General
}
