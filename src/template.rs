/// World-name placeholder; replaced at every occurrence so the template can
/// use it in the title, headings, and metadata alike.
pub const WORLD_TOKEN: &str = "%%%WORLD%%%";
/// Report-body placeholder; replaced at the first occurrence only.
pub const DATA_TOKEN: &str = "%%%DATA%%%";

pub fn compose(template: &str, world: &str, body: &str) -> String {
    template.replace(WORLD_TOKEN, world).replacen(DATA_TOKEN, body, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_token_is_replaced_everywhere() {
        let out = compose("<title>%%%WORLD%%%</title><h1>%%%WORLD%%%</h1>%%%DATA%%%", "Antica", "<p>x</p>");
        assert_eq!(out, "<title>Antica</title><h1>Antica</h1><p>x</p>");
    }

    #[test]
    fn data_token_is_replaced_once() {
        let out = compose("%%%DATA%%%|%%%DATA%%%", "Antica", "body");
        assert_eq!(out, "body|%%%DATA%%%");
    }

    #[test]
    fn template_without_tokens_passes_through() {
        let out = compose("<p>static</p>", "Antica", "body");
        assert_eq!(out, "<p>static</p>");
    }

    #[test]
    fn token_text_inside_the_body_is_not_reprocessed() {
        // Replacement scans left to right over the template, so a world name
        // or body containing token text must not recurse.
        let out = compose("%%%DATA%%%", "Antica", "literal %%%WORLD%%% stays");
        assert_eq!(out, "literal %%%WORLD%%% stays");
    }
}
