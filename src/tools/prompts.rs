use crate::tools::fetcher::truncate_chars;

pub const TOOL_EXTRACTION_SYSTEM: &str = "You are a tech researcher specializing in developer tools.
Extract specific tool, library, platform, or service names from articles.
Focus on actual products developers can use, not general concepts.";

pub const TOOL_ANALYSIS_SYSTEM: &str = "You are analyzing developer tools. Extract structured information.
Be concise and accurate. If information is not found, use appropriate defaults.";

pub const RECOMMENDATIONS_SYSTEM: &str = "You are a senior developer giving concise tech recommendations.
Be direct and actionable. Format with markdown for readability.";

pub fn tool_extraction_user(query: &str, content: &str, max_chars: usize) -> String {
    format!(
        r#"Query: {query}

Article Content:
{content}

Extract the most relevant tool/service names for "{query}".

Rules:
- Only actual product names (not generic terms)
- Tools developers can directly use
- Include open source and commercial options
- Maximum 5 tools
- Return ONLY tool names, one per line

Example output:
Supabase
PlanetScale
Railway"#,
        content = truncate_chars(content, max_chars)
    )
}

pub fn tool_analysis_user(tool_name: &str, content: &str, max_chars: usize) -> String {
    format!(
        r#"Tool: {tool_name}

Content:
{content}

Analyze and return a JSON object with:
{{
    "pricing_model": "Free" | "Freemium" | "Paid" | "Enterprise" | "Unknown",
    "is_open_source": true | false | null,
    "tech_stack": ["list of supported technologies"],
    "description": "One sentence about what it does",
    "api_available": true | false | null,
    "language_support": ["Python", "JavaScript", etc.],
    "integration_capabilities": ["GitHub", "Docker", etc.]
}}

Return ONLY valid JSON, no markdown formatting."#,
        content = truncate_chars(content, max_chars)
    )
}

pub fn recommendations_user(query: &str, tools_data: &str) -> String {
    format!(
        r#"Query: {query}

Tools Analyzed:
{tools_data}

Provide recommendations in this format:

## Top Pick
[Best tool and why in 2-3 sentences]

## Pricing Comparison
| Tool | Model | Best For |
|------|-------|----------|
[Fill table]

## Quick Verdict
[2-3 sentences on which to choose based on use case]

Keep it brief and useful for developers."#
    )
}
