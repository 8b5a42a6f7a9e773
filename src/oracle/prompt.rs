//! Prompt builders for each oracle call, keyed by locale.

use crate::locale::Locale;

/// Prompt asking the oracle for the sensor aggregation query.
pub fn sql_generation(locale: Locale) -> String {
    match locale {
        Locale::En => "You are an SQL expert. Given the following instruction, generate a valid SQL query for PostgreSQL.\n\
            The SQL query must be **only the SQL code**, without explanations, comments, or code block delimiters (like `sql or `).\n\
            Instruction: Generate a valid SQL query for PostgreSQL that selects, for each date of the last three days, the date, minimum value, \
            average value, and maximum value of the 'value' column from the 'sensor_data' table. \
            The query should group the results by date (excluding the time) and round the minimum, average, and maximum values to two decimal places. \
            Also, the results should be ordered in ascending order by date. \
            Only respond with the SQL query, without explanations, observations, conclusions, or comments.\n\
            SQL Query:"
            .to_string(),
        Locale::Es => "Eres un experto en SQL. Dada la siguiente instrucción, genera una consulta SQL válida para PostgreSQL.\n\
            La consulta SQL debe ser **solo el código SQL**, sin explicaciones, comentarios ni delimitadores de bloque de código (como `sql o `).\n\
            Instrucción: Genera una consulta SQL válida para PostgreSQL que seleccione, para cada fecha de los últimos tres días, la fecha, el valor mínimo, \
            el valor promedio y el valor máximo de la columna 'valor' de la tabla 'datos_sensor'. \
            La consulta debe agrupar los resultados por fecha (sin incluir la hora) y redondear los valores mínimo, promedio y máximo a dos decimales. \
            Además, los resultados deben ordenarse en orden ascendente por fecha. \
            Solo responde con la consulta SQL, sin explicaciones, observaciones, conclusiones ni comentarios.\n\
            Consulta SQL:"
            .to_string(),
    }
}

/// Prompt asking the oracle to format query results as a Markdown report.
pub fn report(locale: Locale, results: &str) -> String {
    let [date, min, avg, max] = locale.report_columns();
    match locale {
        Locale::En => format!(
            "You are a data analyst. Based on the following results obtained from the database, \
             generate a detailed report in Markdown format. The report should include the date, minimum value, \
             average value, and maximum value for each date, and present the values with exactly two decimal places. \
             The results should be presented in a table with the following columns: '{date}', '{min}', '{avg}', \
             and '{max}'.\n\n\
             - Numeric values should be right-aligned.\n\
             - Ensure that numeric values (minimum, average, maximum) have two decimal places.\n\
             - Results should be in ascending order by date.\n\n\
             Results:\n{results}\n\
             Report:"
        ),
        Locale::Es => format!(
            "Eres un analista de datos. A partir de los siguientes resultados obtenidos de la base de datos, \
             genera un reporte detallado en formato markdown. El reporte debe incluir la fecha, el valor mínimo, \
             el valor promedio y el valor máximo para cada fecha, y debe presentar los valores con exactamente dos decimales. \
             Los resultados deben ser presentados en una tabla con las siguientes columnas: '{date}', '{min}', '{avg}' \
             y '{max}'.\n\n\
             - Los valores numéricos deben estar alineados a la derecha.\n\
             - Asegúrate de que los valores numéricos (mínimo, promedio, máximo) tengan dos decimales.\n\
             - Los resultados deben estar en orden ascendente según la fecha.\n\n\
             Resultados:\n{results}\n\
             Reporte:"
        ),
    }
}

/// Fallback prompt asking the oracle to re-emit the report's table as plain
/// JSON rows. Used only when the table cannot be parsed directly; the oracle
/// produces data here, never code.
pub fn row_extraction(locale: Locale, report_markdown: &str) -> String {
    match locale {
        Locale::En => format!(
            "You are given a soil-moisture report in Markdown format. Extract the data table \
             and return it as a JSON array, one object per row, with exactly these keys: \
             \"date\" (string, YYYY-MM-DD), \"min_value\" (number), \"avg_value\" (number), \
             \"max_value\" (number).\n\
             Return ONLY the JSON array, without explanations, comments, or code block delimiters.\n\n\
             Markdown Report:\n{report_markdown}\n\nJSON:"
        ),
        Locale::Es => format!(
            "Se te proporciona un informe de humedad del suelo en formato Markdown. Extrae la tabla \
             de datos y devuélvela como un array JSON, un objeto por fila, con exactamente estas claves: \
             \"date\" (cadena, YYYY-MM-DD), \"min_value\" (número), \"avg_value\" (número), \
             \"max_value\" (número).\n\
             Devuelve SOLO el array JSON, sin explicaciones, comentarios ni delimitadores de bloque de código.\n\n\
             Informe Markdown:\n{report_markdown}\n\nJSON:"
        ),
    }
}

/// Prompt asking the oracle to draft the HTML email around the humidity table.
pub fn email(locale: Locale, markdown_table: &str, recipient: &str) -> String {
    match locale {
        Locale::En => format!(
            r#"You are an expert in botany and plant care, particularly for Monstera adansonii. Based on the following soil moisture analysis for a Monstera adansonii, write a VERY SHORT AND CONCISE email addressed to {recipient}. The email should:

1. **Start ABSOLUTELY with: `Hello,` (without quotes, EXACTLY like this)**
2. **Summarize in a VERY CONCISE manner the evolution of soil moisture** over the analyzed dates (extracted from the Markdown table). Mention only the most relevant points.
3. **Directly and concisely analyze whether the moisture levels are suitable for a Monstera adansonii.** DO NOT give manual watering tips; JUST STATE WHETHER THE LEVELS ARE APPROPRIATE OR NOT.
4. **Briefly identify and mention any abnormal moisture values** (if present, be very direct).
5. **Attach a graph (mention that it is attached).** Be brief; just state that a soil moisture graph is attached.
6. **End the email with the following EXACT closing:** Best regards, GardenCare AI System

**IMPORTANT:**
- Use a professional, concise, and informative tone.
- Use **HTML formatting to bold key parts of the text.**
- **DO NOT INCLUDE the email subject in the email body.**
- Be **VERY BRIEF AND TO THE POINT throughout the email.**

<!DOCTYPE html>
<html>
<head>
    <meta charset='UTF-8'>
</head>
<body>
    <p><strong>Hello,</strong></p>
    <p>Analyzing the soil moisture data for your Monstera adansonii from [START DATE] to [END DATE]:</p>
    <ul>
        <li>Average moisture: between <strong>[MIN-MAX MOISTURE RANGE]%</strong>. <strong>[STATEMENT ON WHETHER LEVELS ARE ADEQUATE]</strong></li>
    </ul>
    <p><strong>[SUGGESTION BASED ON ANALYSIS].</strong></p>
    <p>[STATEMENT ON ABNORMAL VALUES, IF APPLICABLE, OTHERWISE OMIT].</p>
    <p>Attached is a graph with a detailed evolution of soil moisture.</p>
    <p><strong>Best regards,</strong></p>
    <p>GardenCare AI System</p>
</body>
</html>

Soil moisture data (Markdown table):
{markdown_table}

**RETURN ONLY THE COMPLETE HTML CODE OF THE EMAIL**"#
        ),
        Locale::Es => format!(
            r#"Eres un experto en botánica y cuidado de plantas, especialmente de Monstera adansonii. Basándote en el siguiente análisis de humedad del suelo para una planta de Monstera adansonii, redacta un email MUY CORTO Y CONCISO dirigido a {recipient}. El email debe:

1. **Comienza el email ABSOLUTAMENTE con: `Hola,` (sin comillas, EXÁCTAMENTE así)**
2. **Resumir de forma MUY CONCISA la evolución de la humedad del suelo** durante las fechas analizadas (extraídas de la tabla Markdown). Menciona solo lo más relevante.
3. **Analizar de forma DIRECTA Y CONCISA si los valores de humedad son adecuados para una Monstera adansonii.** NO des consejos de riego manual, SIMPLEMENTE INDICA SI LOS NIVELES SON ADECUADOS O NO.
4. **Identificar y mencionar de forma MUY BREVE si se detectan valores de humedad atípicos** (si los hay, sé muy directo).
5. **Adjuntar un gráfico (mencionar que se adjunta).** Sé breve, solo indica que se adjunta un gráfico de humedad.
6. **Cerrar el email con la siguiente despedida EXACTA:** Saludos cordiales, GardenCare AI System

**IMPORTANTE:**
- Utiliza un tono profesional, conciso e informativo.
- Utiliza **formato HTML para poner en negrita las partes importantes del texto.**
- **NO INCLUYAS el Asunto del email en el cuerpo del email.**
- Sé **MUY BREVE Y DIRECTO en todo el email.**

<!DOCTYPE html>
<html>
<head>
    <meta charset='UTF-8'>
</head>
<body>
    <p><strong>Hola,</strong></p>
    <p>Analizando los datos de humedad del suelo para su Monstera adansonii del [FECHA INICIO] al [FECHA FIN]:</p>
    <ul>
        <li>Humedad promedio: entre <strong>[RANGO HUMEDAD MIN-MAX]%</strong>. <strong>[FRASE SI LOS VALORES SON ADECUADOS]</strong></li>
    </ul>
    <p><strong>[FRASE DE SUGERENCIA BASADA EN EL ANÁLISIS].</strong></p>
    <p>[FRASE VALORES ATÍPICOS, SI APLICA, SI NO, NO MENCIONAR NADA].</p>
    <p>Adjunto un gráfico con la evolución detallada de la humedad del suelo.</p>
    <p><strong>Saludos cordiales,</strong></p>
    <p>GardenCare AI System</p>
</body>
</html>

Datos de humedad del suelo (tabla Markdown):
{markdown_table}

**DEVUELVE SOLO EL CÓDIGO HTML COMPLETO DEL EMAIL**"#
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_generation_names_the_table() {
        assert!(sql_generation(Locale::En).contains("sensor_data"));
        assert!(sql_generation(Locale::Es).contains("datos_sensor"));
    }

    #[test]
    fn test_report_uses_locale_columns() {
        let en = report(Locale::En, "(2025-04-01, 1.0, 2.0, 3.0)");
        assert!(en.contains("'min_value'"));
        assert!(en.contains("(2025-04-01, 1.0, 2.0, 3.0)"));

        let es = report(Locale::Es, "(2025-04-01, 1.0, 2.0, 3.0)");
        assert!(es.contains("'valor_promedio'"));
    }

    #[test]
    fn test_email_embeds_recipient_and_table() {
        let prompt = email(Locale::En, "| date |", "owner@example.com");
        assert!(prompt.contains("owner@example.com"));
        assert!(prompt.contains("| date |"));
        assert!(prompt.contains("GardenCare AI System"));
    }

    #[test]
    fn test_row_extraction_demands_json_only() {
        let prompt = row_extraction(Locale::En, "# report");
        assert!(prompt.contains("JSON array"));
        assert!(prompt.contains("# report"));
    }
}
