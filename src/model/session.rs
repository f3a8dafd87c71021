/// Estado mutável de uma sessão de anotação. Explícito de propósito:
/// usuário atual e cursor nunca viram estado global do processo.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub annotator: String,
    pub cursor: usize,
}
