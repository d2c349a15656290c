//! Prompt text for the two model calls.

/// Schema description handed to the SQL generator.
pub const SCHEMA_INFO: &str = "Table: sales_sale
Columns:
- id: INTEGER (Primary Key)
- date: DATE
- price_sold: DECIMAL(10,2)
- price_purchased: DECIMAL(10,2)
- product_name: VARCHAR(200)

Note: Profit = price_sold - price_purchased";

const SQL_INSTRUCTION: &str = r#"You are a SQL expert. Generate a SQLite query based on the user's question.

Rules:
1. Return ONLY the SQL query, nothing else
2. Use proper SQLite syntax
3. For date filtering, use date() function
4. For "this month", use: WHERE strftime('%Y-%m', date) = strftime('%Y-%m', 'now')
5. For profit calculations, use: (price_sold - price_purchased)
6. Always use proper column names as shown in schema
7. Do not use markdown formatting or code blocks

Examples:
Question: "How much profit did product ABC make this month?"
Query: SELECT SUM(price_sold - price_purchased) as total_profit FROM sales_sale WHERE product_name = 'ABC' AND strftime('%Y-%m', date) = strftime('%Y-%m', 'now')

Question: "What are total sales for product XYZ?"
Query: SELECT COUNT(*) as total_sales, SUM(price_sold) as total_revenue FROM sales_sale WHERE product_name = 'XYZ'"#;

const ANSWER_INSTRUCTION: &str = "You are a helpful assistant that explains database query results in natural language.

Given the user's question and the query results, provide a clear, concise answer.
Format numbers nicely (e.g., currency with $ and 2 decimal places).
If no results were found, say so politely.";

/// Single prompt: instructions, rules, examples, schema, then the question.
pub fn sql_prompt(schema: &str, question: &str) -> String {
    format!(
        "{}\n\nDatabase Schema:\n{}\n\nUser Question: {}\n\nGenerate SQL query:",
        SQL_INSTRUCTION, schema, question
    )
}

pub fn answer_prompt(question: &str, results: &str) -> String {
    format!(
        "{}\n\nQuestion: {}\n\nQuery Results: {}\n\nProvide a natural language answer:",
        ANSWER_INSTRUCTION, question, results
    )
}
