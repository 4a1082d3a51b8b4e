/// Orquesta task names may not contain dashes; Mistral names frequently do.
/// Every task key and every `do` reference must go through the same mapping
/// so renamed tasks stay reachable.
pub fn translate_task_name(name: &str) -> String {
    name.replace('-', "_")
}
