//! Prompt construction for the three detector categories.
//!
//! Templates enumerate concrete vulnerable/safe example pairs and pin the
//! output contract hard. That contract is a mitigation, not a guarantee; the
//! extractor assumes it can fail.

use anyhow::Result;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct PromptTemplate {
    pub name: String,
    pub system_prompt: String,
    pub user_prompt_template: String,
    pub focus_areas: Vec<String>,
}

impl PromptTemplate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            system_prompt: String::new(),
            user_prompt_template: String::new(),
            focus_areas: Vec::new(),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_user_template(mut self, template: impl Into<String>) -> Self {
        self.user_prompt_template = template.into();
        self
    }

    pub fn with_focus_areas(mut self, areas: Vec<String>) -> Self {
        self.focus_areas = areas;
        self
    }
}

pub struct PromptBuilder {
    templates: HashMap<String, PromptTemplate>,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptBuilder {
    pub fn new() -> Self {
        let mut builder = Self {
            templates: HashMap::new(),
        };

        builder.add_template(Self::injection_template());
        builder.add_template(Self::cross_site_scripting_template());
        builder.add_template(Self::secret_exposure_template());

        builder
    }

    pub fn add_template(&mut self, template: PromptTemplate) {
        self.templates.insert(template.name.clone(), template);
    }

    pub fn build_prompt(
        &self,
        template_name: &str,
        variables: HashMap<String, String>,
    ) -> Result<(String, String)> {
        let template = self
            .templates
            .get(template_name)
            .ok_or_else(|| anyhow::anyhow!("Template '{}' not found", template_name))?;

        let system_prompt = substitute_variables(&template.system_prompt, &variables);
        let user_prompt = substitute_variables(&template.user_prompt_template, &variables);

        Ok((system_prompt, user_prompt))
    }

    fn injection_template() -> PromptTemplate {
        PromptTemplate::new("injection")
            .with_system_prompt(INJECTION_SYSTEM_PROMPT)
            .with_user_template(INJECTION_USER_TEMPLATE)
            .with_focus_areas(vec![
                "String-built queries".to_string(),
                "Command construction".to_string(),
                "Untrusted input reaching interpreters".to_string(),
            ])
    }

    fn cross_site_scripting_template() -> PromptTemplate {
        PromptTemplate::new("cross_site_scripting")
            .with_system_prompt(XSS_SYSTEM_PROMPT)
            .with_user_template(XSS_USER_TEMPLATE)
            .with_focus_areas(vec![
                "Unescaped output into HTML".to_string(),
                "Template rendering of user input".to_string(),
                "DOM sinks".to_string(),
            ])
    }

    fn secret_exposure_template() -> PromptTemplate {
        PromptTemplate::new("secret_exposure")
            .with_system_prompt(SECRET_SYSTEM_PROMPT)
            .with_user_template(SECRET_USER_TEMPLATE)
            .with_focus_areas(vec![
                "Credential literals".to_string(),
                "API keys and tokens".to_string(),
                "Connection strings".to_string(),
            ])
    }
}

fn substitute_variables(template: &str, variables: &HashMap<String, String>) -> String {
    let mut result = template.to_string();

    for (key, value) in variables {
        let placeholder = format!("{{{}}}", key);
        result = result.replace(&placeholder, value);
    }

    result
}

/// Prefixes every source line with its 1-based number and a separator so the
/// model can be asked to reproduce exact line numbers.
pub fn number_source_lines(source: &str) -> String {
    source
        .lines()
        .enumerate()
        .map(|(index, line)| format!("{} | {}", index + 1, line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The structural contract every template pins. Injected as the
/// `{output_contract}` variable so the three templates stay in lockstep.
pub const OUTPUT_CONTRACT: &str = r#"OUTPUT CONTRACT (strict):
Return ONLY a single compact JSON array, with no surrounding prose, markdown, or code fences.
Every element must name every field explicitly:
[{"vulnerability_type":"<category>","severity":"CRITICAL|HIGH|MEDIUM|LOW","line_number":<1-based integer from the numbered source>,"code_snippet":"<the offending line>","explanation":"<why this is exploitable>","fix_suggestion":"<concrete remediation>","confidence":<number between 0.0 and 1.0>}]
If the file has no such issues, return exactly []."#;

const INJECTION_SYSTEM_PROMPT: &str = r#"You are a SQL injection vulnerability specialist reviewing one source file.

FOCUS: Find every place where untrusted input can reach a query or command interpreter.

PATTERNS TO DETECT:
1. String concatenation into SQL: query = "SELECT * FROM users WHERE id = '" + user_id + "'"
2. Format interpolation into SQL: f"SELECT * FROM users WHERE name = '{name}'" or "... WHERE id = %s" % user_id
3. .format() built statements passed to execute()
4. Shell or eval invocations built from request parameters

SAFE PATTERNS (do NOT report):
- Parameterized queries: cursor.execute("SELECT * FROM users WHERE id = ?", (user_id,))
- Named parameters: cursor.execute(query, {"username": username})
- Static statements with no interpolated input

Severity guidance: direct concatenation of request input into a statement is CRITICAL; interpolation of partially validated input is HIGH; interpolation of internal values that could become tainted is MEDIUM."#;

const INJECTION_USER_TEMPLATE: &str = r#"Analyze this {language} file ({filename}) for SQL injection vulnerabilities.
Line numbers are already prefixed; report them exactly as given.

{numbered_source}

{output_contract}"#;

const XSS_SYSTEM_PROMPT: &str = r#"You are a cross-site scripting vulnerability specialist reviewing one source file.

FOCUS: Find every place where user-controlled data is written into HTML, a template, or a DOM sink without escaping.

PATTERNS TO DETECT:
1. Interpolated HTML responses: return f"<div>{request.args.get('name')}</div>"
2. render_template_string with user input embedded in the template
3. mark_safe / |safe applied to user-controlled values
4. DOM sinks: element.innerHTML = userInput, document.write(params)

SAFE PATTERNS (do NOT report):
- Auto-escaping template rendering with values passed as context
- Explicit escaping before output (html.escape, markupsafe.escape)
- textContent / innerText assignment

Severity guidance: reflected request parameters reaching HTML unescaped are HIGH or CRITICAL depending on context; stored or DOM-based sinks with user data are CRITICAL."#;

const XSS_USER_TEMPLATE: &str = r#"Analyze this {language} file ({filename}) for cross-site scripting vulnerabilities.
Line numbers are already prefixed; report them exactly as given.

{numbered_source}

{output_contract}"#;

const SECRET_SYSTEM_PROMPT: &str = r#"You are a hardcoded secret and credential exposure specialist reviewing one source file.

FOCUS: Find every credential, key, or token committed as a literal.

PATTERNS TO DETECT:
1. Assignments of live-looking keys: API_KEY = "sk-live-abc123"
2. Password literals: password = "hunter2", DB_PASSWORD = "prod-secret"
3. Tokens and signing secrets: JWT_SECRET = "...", AWS_SECRET_ACCESS_KEY = "..."
4. Connection strings embedding credentials: "postgres://admin:admin@db/prod"

SAFE PATTERNS (do NOT report):
- Environment lookups: os.getenv('API_KEY'), os.environ.get('DB_PASSWORD')
- Values loaded from a secrets manager or config file outside the repo
- Obvious placeholders in examples: "<your-key-here>", "changeme" in test fixtures

Severity guidance: production-looking credentials are CRITICAL; ambiguous literals that may be placeholders are MEDIUM with reduced confidence."#;

const SECRET_USER_TEMPLATE: &str = r#"Analyze this {language} file ({filename}) for hardcoded secrets.
Line numbers are already prefixed; report them exactly as given.

{numbered_source}

{output_contract}"#;
