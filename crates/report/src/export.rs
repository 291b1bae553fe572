use thiserror::Error;

use crate::summary::RangeReport;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to finish csv: {0}")]
    Finish(String),
    #[error("csv output was not valid utf-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Renders a report as a multi-section CSV document: a totals block, the
/// member breakdown, then the per-item breakdown, separated by blank rows.
pub fn report_csv(report: &RangeReport) -> Result<String, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());

    writer.write_record([
        "Report From",
        &report.range.start.to_string(),
        "To",
        &report.range.end.to_string(),
    ])?;
    writer.write_record([""])?;

    writer.write_record(["Totals"])?;
    writer.write_record([
        "Total Expense (BDT)",
        &format!("{:.2}", report.total_expense.amount()),
    ])?;
    writer.write_record(["Total Meals", &report.total_meals.to_string()])?;
    writer.write_record([
        "Per Meal (BDT)",
        &format!("{:.2}", report.per_meal_average.amount()),
    ])?;
    writer.write_record([""])?;

    writer.write_record(["Member Breakdown"])?;
    writer.write_record(["Member", "Meals", "Grand Total Price (BDT)"])?;
    for member in &report.by_member {
        writer.write_record([
            member.name.as_str(),
            &member.meals.to_string(),
            &format!("{:.2}", member.grand_total.amount()),
        ])?;
    }
    writer.write_record([""])?;

    writer.write_record(["Individual Item Breakdown"])?;
    writer.write_record([
        "Item",
        "Grand Total Price (BDT)",
        "Total Meals",
        "Per Meal Cost (BDT)",
    ])?;
    for item in &report.by_item {
        writer.write_record([
            item.item_name.as_str(),
            &format!("{:.2}", item.total_cost.amount()),
            &item.lifetime_meals.to_string(),
            &format!("{:.2}", item.per_meal_cost),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Finish(e.to_string()))?;
    Ok(String::from_utf8(bytes)?)
}
