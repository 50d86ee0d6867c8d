//! Prompt templates for the sale-strategy simulation.
//!
//! Placeholders are context keys, except `{format_instructions}` and
//! `{current_date}` which are bound when the pipeline is built.

/// Turns the scenario into one web search query.
pub const SEARCH_QUERY: &str = r#"You are an expert at generating web search queries for real estate analysis.
Based on the following scenario, create a list of 3-5 distinct and effective search queries to find the most current information available as of {current_date}.

**Scenario**: "{scenario}"

**Information Required**:
1. The overall economic state of the real estate market in that specific location (e.g., market trends, new construction, buyer sentiment).
   a. Market Price & Transaction Trends: Target official data such as the house price index for the specific city or postcode, analyze quarterly price changes, and track sales transaction volumes.
   b. Housing Supply & Inventory: Investigate the volume of current property listings, the rate of new listings coming to market, and the pipeline of new construction projects approved or underway.
   c. Buyer Demand & Sentiment: Find data on buyer activity, such as mortgage approval rates for the region, average time on market for properties, and the sale-to-asking-price ratio to gauge negotiation power.
   d. Local Economic Context: Assess how national economic factors like interest rates and inflation are affecting the local market, and find information on local rental yields as an indicator of investment health.
2. The average price or price range for the type of property mentioned.
3. Average cost of property in that location.

**Generate a list of search queries here (one query per line)**:
"#;

/// Market analysis over the retrieved documents and the seller's brief.
pub const ANALYST: &str = r"You are an expert real estate analyst. Your task is to perform a detailed diagnosis of a property scenario.
First, you MUST review the live market data provided below to ground your analysis in the most current information.
Then, proceed with your step-by-step thinking.

---
**Live Market Context from Web Search**:
{market_context}
---

**Property Scenario Details**:
- **Scenario**: {scenario}
- **Goal**: {goal}
- **Constraint**: {constraint}

Produce a detailed text analysis based on BOTH the live context and your internal knowledge. Do not suggest solutions yet.
";

/// Diagnoses why the property has not sold.
pub const DIAGNOSIS: &str = r"You are a master diagnostician. Your job is to read a detailed real estate analysis and identify the single, most critical issue.
Synthesize the core problem into one concise sentence.

**Full Analyst Report**:
{analyst_output}

**Concise Diagnosis (1 sentence)**:
";

/// Brainstorms strategies against the diagnosis.
pub const STRATEGIST: &str = r#"You are a creative real estate strategist. Based on the analysis and the core diagnosis, brainstorm a numbered list of diverse and actionable strategies.
Consider pricing and financial strategies, marketing and exposure, agent representation and incentives, and property staging and presentation.
Think outside the box.

**Core Diagnosis**: {diagnosis_output}

**Full Analyst Report**:
{analyst_output}

**The strategies should be specific and actionable, and carry exact numbers to keep them precise.
Example of specific actionable strategies: "Reposition guide to £4.25M", "Switch to performance-led agent within 14 days", "Reframe marketing with withdrawn comp narrative".
Brainstorm at least 5-7 potential strategies (as a numbered list)**:
"#;

/// Scores each strategy in free text.
pub const EVALUATOR: &str = r#"You are a highly analytical real estate simulation engine. Your task is to rigorously evaluate a list of proposed strategies using a detailed, multi-criteria scoring framework.

**Context**:
- **Current Date**: {current_date}
- **Core Diagnosis**: {diagnosis_output}
- **Brainstormed Strategies from your strategist team**:
{strategist_output}

**Your Task**:
For each "Brainstormed Strategy", provide a detailed evaluation. Follow this structure precisely:

---
**Strategy**: [Name of the Strategy]
**Analysis**:
* **Pros (Why it might succeed)**:
    1. [Reason 1, considering current market conditions]
    2. [Reason 2]
    3. [Reason 3]
* **Cons (Potential risks or failures)**:
    1. [Reason 1]
    2. [Reason 2]
    3. [Reason 3]

**Scoring (0-10 scale)**:
* **Impact Score**: [Assign a score based on its potential to achieve the main goal. Justify briefly.]
* **Speed Score**: [Assign a score based on how quickly it will yield results. Justify briefly.]
* **Cost-Risk Score**: [Assign a score representing low cost and low risk (10 = very cheap/safe). Justify briefly.]

**Weighted Overall Score**: [Calculate the final score using the formula: (Impact * 0.5) + (Speed * 0.3) + (Cost-Risk * 0.2). Show the result as a number between 0 and 10.]
---

Repeat this evaluation for every strategy provided. Produce only this text analysis. Do not add any summary or conclusion.
"#;

/// Extracts the evaluation into a `StrategyEvaluationList`.
pub const EVALUATION_PARSER: &str = r"You are a data extraction agent. Parse the block of text containing strategy evaluations and convert it into a structured JSON format.

**Unstructured Evaluation Text**:
{evaluation_output}

{format_instructions}
";

/// Commentary on agent and seller behaviour.
pub const BEHAVIOUR: &str = r"You are a behavioural psychologist specializing in high-stakes negotiations.
Based on the property's diagnosis and the final recommended strategy, what key behaviours should the seller and their agent adopt or avoid?
Focus on mindset, communication, and negotiation posture.

**Property Diagnosis**: {diagnosis_output}
**Final Chosen Strategy**: {final_structured_output}

**Key Behavioural Recommendations (for seller/agent)**:
";

/// Synthesizes the `FinalReport`.
pub const REPORT: &str = r"You are a professional real estate analyst and report writer. Your task is to synthesize all the data from a simulation engine into a single, comprehensive, and human-readable report memo.

**Input Data from Simulation Engine**:
- **Core Diagnosis**: {diagnosis_output}
- **Structured Strategy Evaluations**: {structured_evaluation}
- **Final Recommended Actions Summary**: {final_structured_output}
- **Behavioural Commentary**: {behavioural_output}
- **Raw Evaluation Text (for justifications)**: {evaluation_output}

**Your Instructions**:

1. **Diagnosis Section**: Write a clear, concise paragraph for the `diagnosis_summary` field.
2. **Strategic Actions Section**: For the `detailed_actions` field, create a list of objects with keys 'name' and 'explanation'. The 'explanation' should summarize what the action involves and why it's effective, drawing from the pros.
3. **Forecast Analysis Section**: For the `forecast_analysis` field, write a detailed analysis. Start with the overall simulation score. Then, for each recommended action, state its name and overall score, and justify its Impact, Speed, and Cost-Risk scores using the raw text.
4. **Behavioural Commentary Section**: For the `behavioural_commentary` field, summarize the top 3 suggestions from the input text in a concise and clear manner.
5. **Final Output**: Assemble all these sections into a single JSON object that adheres to the format instructions.

{format_instructions}
";
