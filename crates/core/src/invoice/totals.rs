//! Invoice totals calculation.
//!
//! Pure calculation of line totals, subtotal, tax, and grand total.
//! Rounding is applied at each derived value independently: per line
//! first, then the subtotal of the rounded lines, then tax, then total.

use rust_decimal::Decimal;

use facture_shared::types::round2;

use super::error::InvoiceError;

/// A single line item supplied on invoice creation or edit.
#[derive(Debug, Clone)]
pub struct LineItemInput {
    /// Free-form description of the billable row.
    pub description: String,
    /// Quantity (must be positive).
    pub quantity: Decimal,
    /// Price per unit (must not be negative).
    pub unit_price: Decimal,
}

/// Computed totals for an invoice, all at 2-decimal precision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceTotals {
    /// Rounded total for each line, in input order.
    pub line_totals: Vec<Decimal>,
    /// Sum of the rounded line totals, rounded.
    pub subtotal: Decimal,
    /// `subtotal * tax_rate / 100`, rounded.
    pub tax_amount: Decimal,
    /// `subtotal + tax_amount`, rounded.
    pub total: Decimal,
}

/// Calculates invoice totals from line items and a tax rate.
///
/// # Errors
///
/// Returns `InvoiceError` if the item list is empty, any quantity is
/// non-positive, any unit price is negative, or the tax rate falls
/// outside 0-100.
pub fn calculate_totals(
    items: &[LineItemInput],
    tax_rate: Decimal,
) -> Result<InvoiceTotals, InvoiceError> {
    if items.is_empty() {
        return Err(InvoiceError::NoItems);
    }
    if tax_rate < Decimal::ZERO || tax_rate > Decimal::ONE_HUNDRED {
        return Err(InvoiceError::InvalidTaxRate(tax_rate));
    }

    let mut line_totals = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        if item.quantity <= Decimal::ZERO {
            return Err(InvoiceError::NonPositiveQuantity { index });
        }
        if item.unit_price < Decimal::ZERO {
            return Err(InvoiceError::NegativeUnitPrice { index });
        }
        line_totals.push(round2(item.quantity * item.unit_price));
    }

    let subtotal = round2(line_totals.iter().copied().sum());
    let tax_amount = round2(subtotal * tax_rate / Decimal::ONE_HUNDRED);
    let total = round2(subtotal + tax_amount);

    Ok(InvoiceTotals {
        line_totals,
        subtotal,
        tax_amount,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(quantity: Decimal, unit_price: Decimal) -> LineItemInput {
        LineItemInput {
            description: "Consulting".to_string(),
            quantity,
            unit_price,
        }
    }

    #[test]
    fn test_single_line_with_tax() {
        let totals = calculate_totals(&[item(dec!(2), dec!(50))], dec!(10)).unwrap();

        assert_eq!(totals.line_totals, vec![dec!(100.00)]);
        assert_eq!(totals.subtotal, dec!(100.00));
        assert_eq!(totals.tax_amount, dec!(10.00));
        assert_eq!(totals.total, dec!(110.00));
    }

    #[test]
    fn test_midpoint_rounding_per_stage() {
        // 2 x 10.005 = 20.01 per line (half-up), tax 10% of 20.01 = 2.001 -> 2.00
        let totals = calculate_totals(&[item(dec!(2), dec!(10.005))], dec!(10)).unwrap();

        assert_eq!(totals.line_totals, vec![dec!(20.01)]);
        assert_eq!(totals.subtotal, dec!(20.01));
        assert_eq!(totals.tax_amount, dec!(2.00));
        assert_eq!(totals.total, dec!(22.01));
    }

    #[test]
    fn test_rounding_happens_per_line_first() {
        // Each line is 3 x 0.335 = 1.005 -> 1.01 rounded per line.
        // Summing raw values first would give 2.01, not 2.02.
        let totals =
            calculate_totals(&[item(dec!(3), dec!(0.335)), item(dec!(3), dec!(0.335))], dec!(0))
                .unwrap();

        assert_eq!(totals.line_totals, vec![dec!(1.01), dec!(1.01)]);
        assert_eq!(totals.subtotal, dec!(2.02));
    }

    #[test]
    fn test_total_equals_subtotal_plus_tax() {
        let totals = calculate_totals(
            &[
                item(dec!(1.5), dec!(33.33)),
                item(dec!(4), dec!(12.99)),
                item(dec!(0.25), dec!(199.95)),
            ],
            dec!(8.25),
        )
        .unwrap();

        assert_eq!(totals.total, round2(totals.subtotal + totals.tax_amount));
    }

    #[test]
    fn test_zero_tax_rate() {
        let totals = calculate_totals(&[item(dec!(3), dec!(25))], dec!(0)).unwrap();

        assert_eq!(totals.tax_amount, dec!(0.00));
        assert_eq!(totals.total, totals.subtotal);
    }

    #[test]
    fn test_zero_unit_price_is_allowed() {
        let totals = calculate_totals(&[item(dec!(1), dec!(0))], dec!(10)).unwrap();
        assert_eq!(totals.total, dec!(0.00));
    }

    #[test]
    fn test_empty_items_rejected() {
        assert_eq!(calculate_totals(&[], dec!(10)), Err(InvoiceError::NoItems));
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let result = calculate_totals(&[item(dec!(0), dec!(10))], dec!(10));
        assert_eq!(result, Err(InvoiceError::NonPositiveQuantity { index: 0 }));
    }

    #[test]
    fn test_negative_quantity_rejected() {
        let result = calculate_totals(&[item(dec!(1), dec!(5)), item(dec!(-2), dec!(10))], dec!(10));
        assert_eq!(result, Err(InvoiceError::NonPositiveQuantity { index: 1 }));
    }

    #[test]
    fn test_negative_unit_price_rejected() {
        let result = calculate_totals(&[item(dec!(1), dec!(-0.01))], dec!(10));
        assert_eq!(result, Err(InvoiceError::NegativeUnitPrice { index: 0 }));
    }

    #[test]
    fn test_tax_rate_out_of_range_rejected() {
        assert_eq!(
            calculate_totals(&[item(dec!(1), dec!(10))], dec!(-1)),
            Err(InvoiceError::InvalidTaxRate(dec!(-1)))
        );
        assert_eq!(
            calculate_totals(&[item(dec!(1), dec!(10))], dec!(100.5)),
            Err(InvoiceError::InvalidTaxRate(dec!(100.5)))
        );
    }

    #[test]
    fn test_fractional_tax_rate() {
        let totals = calculate_totals(&[item(dec!(1), dec!(100))], dec!(7.25)).unwrap();
        assert_eq!(totals.tax_amount, dec!(7.25));
        assert_eq!(totals.total, dec!(107.25));
    }
}
