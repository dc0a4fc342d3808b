//! Markup templates backed by minijinja.
//!
//! Views produce markup strings; these helpers render them from any
//! serializable record with HTML auto-escaping always on, so record values
//! containing `<` or `&` cannot alter the structure of the rendered tree.

use crate::error::DomError;
use minijinja::{AutoEscape, Environment};
use serde::Serialize;

/// Renders an inline template with `data` as its context.
///
/// # Example
///
/// ```rust
/// use serde::Serialize;
/// use tether_dom::render_template;
///
/// #[derive(Serialize)]
/// struct User { name: Option<String> }
///
/// let markup = render_template(
///     "<h2>User: {{ name or 'Anonymous' }}</h2>",
///     &User { name: None },
/// ).unwrap();
/// assert_eq!(markup, "<h2>User: Anonymous</h2>");
/// ```
pub fn render_template<T: Serialize>(source: &str, data: &T) -> Result<String, DomError> {
    let mut env = markup_environment();
    env.add_template_owned("_inline".to_string(), source.to_string())?;
    let tmpl = env.get_template("_inline")?;
    Ok(tmpl.render(data)?)
}

/// A set of named templates compiled once and rendered repeatedly.
///
/// ```rust
/// use tether_dom::Templates;
///
/// let mut templates = Templates::new();
/// templates.add_template("badge", "<span class=\"badge\">{{ count }}</span>").unwrap();
/// let markup = templates.render("badge", &serde_json::json!({ "count": 3 })).unwrap();
/// assert_eq!(markup, "<span class=\"badge\">3</span>");
/// ```
pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    pub fn new() -> Self {
        Self {
            env: markup_environment(),
        }
    }

    /// Registers a named template. Syntax errors are reported here, not at
    /// render time.
    pub fn add_template(&mut self, name: &str, source: &str) -> Result<(), DomError> {
        self.env
            .add_template_owned(name.to_string(), source.to_string())?;
        Ok(())
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.env.get_template(name).is_ok()
    }

    /// Renders a registered template.
    ///
    /// # Errors
    ///
    /// Returns an error if the template name is not found or rendering fails.
    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String, DomError> {
        let tmpl = self.env.get_template(name)?;
        Ok(tmpl.render(data)?)
    }
}

impl Default for Templates {
    fn default() -> Self {
        Self::new()
    }
}

fn markup_environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|_| AutoEscape::Html);
    env
}
